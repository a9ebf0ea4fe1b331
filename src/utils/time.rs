//! Deadline helpers for the free running microsecond counter.
//!
//! The counter is 32 bits wide and wraps roughly every 71 minutes, so every
//! comparison is done on the signed difference instead of the raw values.

/// Returns `true` once `now` has reached or passed `deadline`.
#[inline]
pub const fn deadline_reached(now: u32, deadline: u32) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}

/// Returns `true` if `now` is strictly later than `instant`.
#[inline]
pub const fn is_after(now: u32, instant: u32) -> bool {
    (now.wrapping_sub(instant) as i32) > 0
}
