//! Handoff points between interrupt context and the receiver core.
//!
//! Capture interrupts and serial decoders are the only writers, the receiver
//! core is the only reader. Neither side ever blocks the other for longer
//! than a single copy.

use core::cell::Cell;

use critical_section::Mutex;
use portable_atomic::{AtomicBool, AtomicU16, Ordering};

use crate::{
    consts::{MAX_SUPPORTED_RC_CHANNEL_COUNT, MAX_SUPPORTED_RX_PARALLEL_PWM_OR_PPM_CHANNEL_COUNT, PPM_RCVR_TIMEOUT},
    types::RcChannels,
};

const CAPTURE_CHANNELS: usize = MAX_SUPPORTED_RX_PARALLEL_PWM_OR_PPM_CHANNEL_COUNT;

/// Pulse widths written by PPM or parallel PWM capture interrupts.
///
/// Every channel is a single atomic 16-bit cell, so a read can never observe
/// half of an update.
pub struct CaptureBuffer {
    pulses: [AtomicU16; CAPTURE_CHANNELS],
    new_data: AtomicBool,
}

impl Default for CaptureBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBuffer {
    pub const fn new() -> Self {
        Self {
            pulses: [const { AtomicU16::new(PPM_RCVR_TIMEOUT) }; CAPTURE_CHANNELS],
            new_data: AtomicBool::new(false),
        }
    }

    /// Store a captured pulse width for a channel. Called from the capture interrupt.
    pub fn set_pulse(&self, channel: usize, pulse_us: u16) {
        if let Some(cell) = self.pulses.get(channel) {
            cell.store(pulse_us, Ordering::Relaxed);
        }
    }

    /// Mark a channel as timed out, e.g. when its input stopped toggling.
    pub fn timeout_channel(&self, channel: usize) {
        self.set_pulse(channel, PPM_RCVR_TIMEOUT);
    }

    /// Signal that a full capture (PPM frame, or PWM period) has completed.
    pub fn mark_received(&self) {
        self.new_data.store(true, Ordering::Release);
    }

    pub fn pulse(&self, channel: usize) -> u16 {
        self.pulses
            .get(channel)
            .map_or(PPM_RCVR_TIMEOUT, |cell| cell.load(Ordering::Relaxed))
    }

    /// Returns whether a capture completed since the last call, and clears the flag.
    pub fn take_received(&self) -> bool {
        self.new_data.swap(false, Ordering::Acquire)
    }

    /// Returns `true` if any channel currently holds a captured pulse.
    pub fn any_pulse(&self) -> bool {
        self.pulses
            .iter()
            .any(|cell| cell.load(Ordering::Relaxed) != PPM_RCVR_TIMEOUT)
    }
}

/// A decoded frame from a serial receiver or the telemetry link.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    pub channels: RcChannels,
    /// The receiver itself reported loss of the transmitter
    pub failsafe: bool,
}

crate::const_default!(Frame => {
    channels: [PPM_RCVR_TIMEOUT; MAX_SUPPORTED_RC_CHANNEL_COUNT],
    failsafe: false,
});

#[derive(Copy, Clone)]
struct Slot {
    frame: Frame,
    pending: bool,
}

/// Latest frame published by a protocol decoder.
///
/// The frame and its pending flag are only touched inside a critical section,
/// the receiver core therefore sees the channels of exactly one frame, and
/// sees every frame at most once.
pub struct FrameCell {
    slot: Mutex<Cell<Slot>>,
}

impl Default for FrameCell {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCell {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(Slot {
                frame: Frame::const_default(),
                pending: false,
            })),
        }
    }

    /// Publish a complete frame. Called by the decoder once its checksum passed.
    pub fn publish(&self, frame: Frame) {
        critical_section::with(|cs| self.slot.borrow(cs).set(Slot { frame, pending: true }));
    }

    /// Take the newest frame if one arrived since the last call.
    pub fn take(&self) -> Option<Frame> {
        critical_section::with(|cs| {
            let cell = self.slot.borrow(cs);
            let slot = cell.get();
            if !slot.pending {
                return None;
            }

            cell.set(Slot { pending: false, ..slot });
            Some(slot.frame)
        })
    }
}
