//! Signals published by the receiver task.

use portable_atomic::AtomicBool;

use crate::types::{status::RxStatus, RcChannels};

macro_rules! watch {
    ($name:ident, $datatype:ty, $num:literal, $doc:expr) => {
        #[doc = $doc]
        pub static $name: embassy_sync::watch::Watch<
            embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex,
            $datatype,
            $num,
        > = embassy_sync::watch::Watch::new();
    };
}

watch!(RX_CHANNELS, RcChannels, 4, "Published channel array, always a complete snapshot of one processing cycle.");
watch!(RX_STATUS, RxStatus, 4, "Signal and failsafe state of the last processing cycle.");
watch!(RX_RSSI, u16, 2, "Received signal strength in the range `[0, 1023]`.");

/// Set while the failsafe switch mode is engaged by the pilot.
pub static FAILSAFE_BOX_ACTIVE: AtomicBool = AtomicBool::new(false);
