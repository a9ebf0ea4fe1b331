use crate::{
    consts::{PPM_RCVR_TIMEOUT, PWM_PULSE_MAX, PWM_PULSE_MIN, PWM_RANGE_MAX, PWM_RANGE_MIN},
    types::config::ChannelRange,
    utils::func::scale_range,
};

/// Stretch a sample from the calibrated input range onto the canonical pulse
/// range, then clamp it to the hard pulse limits. The timeout sentinel is
/// passed through untouched.
pub fn apply_range(sample: u16, range: &ChannelRange) -> u16 {
    if sample == PPM_RCVR_TIMEOUT {
        return PPM_RCVR_TIMEOUT;
    }

    let scaled = scale_range(
        sample as i32,
        range.min as i32,
        range.max as i32,
        PWM_RANGE_MIN as i32,
        PWM_RANGE_MAX as i32,
    );

    scaled.clamp(PWM_PULSE_MIN as i32, PWM_PULSE_MAX as i32) as u16
}
