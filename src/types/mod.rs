pub mod config;
pub mod status;

/// One value per logical channel, in microseconds
pub type RcChannels = [u16; crate::consts::MAX_SUPPORTED_RC_CHANNEL_COUNT];
