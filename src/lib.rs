#![cfg_attr(not(test), no_std)]

// Export the logging macros for either defmt or log
#[macro_use]
mod logging;

pub mod consts;
pub mod errors;
pub mod filters;
pub mod rx;
pub mod signals;
pub mod tasks;
pub mod types;
pub mod utils;

// Re-exported for implementors
pub use embassy_sync;
pub use embassy_time;
pub use heapless;

pub use rx::{
    failsafe::FailsafeManager,
    handoff::{CaptureBuffer, Frame, FrameCell},
    rssi::AnalogInput,
    source::{ChannelSource, RxSource, SourceBindings, SourceKind},
    Receiver,
};
pub use types::config::{Configuration, Features, RxConfig};

#[macro_export]
macro_rules! const_default {
    ($type:ty => { $($token:tt)+ } ) => {
        impl $crate::ConstDefault for $type {
            const DEFAULT: Self = Self::const_default();
        }

        impl $type {
            pub const fn const_default() -> Self {
                Self { $($token)+ }
            }
        }

        impl Default for $type {
            fn default() -> Self {
                Self::const_default()
            }
        }
    };
}

pub trait ConstDefault {
    const DEFAULT: Self;
}
