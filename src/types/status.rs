use serde::{Deserialize, Serialize};

use crate::consts::REQUIRED_CHANNEL_MASK;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStatus(u8);

bitflags::bitflags! {
    /// Status of the newest frame of a data driven source. An empty status
    /// means no new frame is pending.
    impl FrameStatus: u8 {

        /// **Bit 0** - A complete frame was received since the last poll.
        const COMPLETE = 1 << 0;

        /// **Bit 1** - The receiver flagged the frame as failsafe.
        const FAILSAFE = 1 << 1;
    }
}

impl FrameStatus {
    pub const PENDING: FrameStatus = FrameStatus::empty();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightChannels(u8);

bitflags::bitflags! {
    /// One bit per channel required for flight. Rebuilt from scratch every
    /// cycle, the vehicle may only fly this cycle if all bits are set.
    impl FlightChannels: u8 {
        const ROLL = 1 << 0;
        const PITCH = 1 << 1;
        const YAW = 1 << 2;
        const THROTTLE = 1 << 3;
    }
}

impl FlightChannels {
    /// Mark a channel as bad for this cycle. Aux channels are ignored.
    pub fn mark_bad(&mut self, channel: usize) {
        if let Some(bit) = 1u8.checked_shl(channel as u32) {
            self.remove(FlightChannels::from_bits_truncate(bit & REQUIRED_CHANNEL_MASK));
        }
    }

    pub fn all_valid(&self) -> bool {
        self.bits() == REQUIRED_CHANNEL_MASK
    }
}

/// Receiver state as published to the rest of the firmware.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxStatus {
    pub signal_received: bool,
    pub failsafe: bool,
    pub flight_channels_valid: bool,
}
