use crate::{
    consts::*,
    types::config::{Features, FailsafeMode, RxConfig},
    utils::time::deadline_reached,
};

/// Receives the per-cycle verdict of the receiver. Owns every consequence
/// for the vehicle, such as landing or disarming.
pub trait FailsafeManager {
    /// All required channels were valid this cycle
    fn on_valid_data_received(&mut self);

    /// At least one required channel was lost, or the failsafe switch is active
    fn on_valid_data_failed(&mut self);

    /// Signal evaluation is suspended for `duration_us`
    fn on_rx_suspend(&mut self, duration_us: u32);

    fn on_rx_resume(&mut self);
}

/// Returns `true` if the pulse lies within the configured bounds, inclusive.
pub fn is_pulse_valid(pulse: u16, config: &RxConfig) -> bool {
    (config.rx_min_usec..=config.rx_max_usec).contains(&pulse)
}

/// Value a channel falls back to once it has been invalid for too long.
/// HOLD, INVALID and AUTO on aux channels resolve to `last_value`.
pub fn rxfail_value(channel: usize, config: &RxConfig, features: Features, last_value: u16) -> u16 {
    let Some(failsafe) = config.failsafe_channels.get(channel) else {
        return last_value;
    };

    // Without stage 2 failsafe the primary channels must not hold, or the vehicle flies away
    let mode = if channel < NON_AUX_CHANNEL_COUNT && !features.contains(Features::FAILSAFE) {
        FailsafeMode::Auto
    } else {
        failsafe.mode
    };

    match mode {
        FailsafeMode::Auto => match channel {
            ROLL | PITCH | YAW => config.midrc,
            THROTTLE => config.throttle_rest_value(features),
            _ => last_value,
        },
        FailsafeMode::Hold | FailsafeMode::Invalid => last_value,
        FailsafeMode::Set => failsafe.value(),
    }
}

/// Per-channel grace period for invalid pulses.
#[derive(Debug, Clone)]
pub struct PulseHold {
    deadlines: [u32; MAX_SUPPORTED_RC_CHANNEL_COUNT],
}

/// Outcome of feeding one sample into [`PulseHold`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulseState {
    /// The pulse is valid and the grace period was restarted
    Valid,
    /// The pulse is invalid, the last value should be held
    Holding,
    /// The pulse has been invalid for too long
    Expired,
}

impl PulseHold {
    pub fn new(now: u32) -> Self {
        Self {
            deadlines: [now.wrapping_add(MAX_INVALID_PULSE_TIME_US); MAX_SUPPORTED_RC_CHANNEL_COUNT],
        }
    }

    pub fn evaluate(&mut self, channel: usize, valid: bool, now: u32) -> PulseState {
        let Some(deadline) = self.deadlines.get_mut(channel) else {
            return PulseState::Expired;
        };

        if valid {
            *deadline = now.wrapping_add(MAX_INVALID_PULSE_TIME_US);
            PulseState::Valid
        } else if deadline_reached(now, *deadline) {
            PulseState::Expired
        } else {
            PulseState::Holding
        }
    }
}
