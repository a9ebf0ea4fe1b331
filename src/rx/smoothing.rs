use crate::{
    consts::{MAX_SUPPORTED_RX_PARALLEL_PWM_OR_PPM_CHANNEL_COUNT, PPM_AND_PWM_SAMPLE_COUNT},
    filters::MovingAverage,
};

/// Moving average over continuously sampled (PPM and parallel PWM) channels
/// to suppress capture jitter. Each channel passes its samples through
/// unchanged until its own history is full.
#[derive(Debug, Clone)]
pub struct ChannelSmoother {
    history: [MovingAverage<PPM_AND_PWM_SAMPLE_COUNT>; MAX_SUPPORTED_RX_PARALLEL_PWM_OR_PPM_CHANNEL_COUNT],
}

impl Default for ChannelSmoother {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelSmoother {
    pub const fn new() -> Self {
        Self {
            history: [MovingAverage::new(); MAX_SUPPORTED_RX_PARALLEL_PWM_OR_PPM_CHANNEL_COUNT],
        }
    }

    pub fn apply(&mut self, channel: usize, sample: u16) -> u16 {
        let Some(history) = self.history.get_mut(channel) else {
            return sample;
        };

        history.push(sample);
        if history.is_full() {
            history.mean()
        } else {
            sample
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_until_full() {
        let mut smoother = ChannelSmoother::new();

        assert_eq!(smoother.apply(0, 1000), 1000);
        assert_eq!(smoother.apply(0, 1100), 1100);
        assert_eq!(smoother.apply(0, 1300), (1000 + 1100 + 1300) / 3);
        assert_eq!(smoother.apply(0, 1301), (1100 + 1300 + 1301) / 3);
    }

    #[test]
    fn test_fill_state_is_per_channel() {
        let mut smoother = ChannelSmoother::new();

        for _ in 0..5 {
            smoother.apply(0, 1500);
        }

        // Channel 1 starts its own history
        assert_eq!(smoother.apply(1, 1200), 1200);
        assert_eq!(smoother.apply(1, 1203), 1203);
        assert_eq!(smoother.apply(1, 1206), 1203);
    }

    #[test]
    fn test_channels_beyond_capture_pass_through() {
        let mut smoother = ChannelSmoother::new();
        assert_eq!(smoother.apply(MAX_SUPPORTED_RX_PARALLEL_PWM_OR_PPM_CHANNEL_COUNT, 1234), 1234);
    }
}
