use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rx::source::SourceKind;

#[non_exhaustive]
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxError {
    #[error("The {0:?} channel source could not be enabled.")]
    SourceUnavailable(SourceKind),
}

#[non_exhaustive]
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("Channel {channel} has a calibration minimum at or above its maximum.")]
    InvalidRange { channel: u8 },
    #[error("The pulse validity bounds are inverted or outside the pulse limits.")]
    InvalidPulseBounds,
    #[error("Channel {channel} has a failsafe step beyond the pulse limits.")]
    InvalidFailsafeStep { channel: u8 },
    #[error("The RSSI scale is outside the supported range.")]
    InvalidRssiScale,
    #[error("The RSSI channel does not exist.")]
    InvalidRssiChannel,
    #[error("The arm switch uses a missing aux channel or an out of range step.")]
    InvalidArmSwitch,
    #[error("The configuration could not be (de)serialized.")]
    Codec,
}

impl From<postcard::Error> for ConfigError {
    fn from(_: postcard::Error) -> Self {
        ConfigError::Codec
    }
}
