use crate::{
    consts::*,
    filters::{MovingAverage, SisoFilter},
    types::config::{Features, RxConfig},
    utils::{func::linear_map, time::deadline_reached},
};

/// Analog input carrying an RSSI voltage, sampled on demand.
pub trait AnalogInput {
    fn read(&mut self) -> u16;
}

impl<F: FnMut() -> u16> AnalogInput for F {
    fn read(&mut self) -> u16 {
        self()
    }
}

/// How the signal strength is derived, decided once from the configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RssiMode {
    Disabled,
    /// Zero-based index of the channel carrying the RSSI pulse
    Channel { channel: usize, invert: bool },
    Analog { scale: u8 },
}

impl RssiMode {
    pub fn select(config: &RxConfig, features: Features) -> Self {
        if config.rssi_channel > 0 {
            RssiMode::Channel {
                channel: config.rssi_channel as usize - 1,
                invert: config.rssi_ppm_invert,
            }
        } else if features.contains(Features::RSSI_ADC) {
            RssiMode::Analog {
                scale: config.rssi_scale.max(RSSI_SCALE_MIN),
            }
        } else {
            RssiMode::Disabled
        }
    }
}

/// Map an RSSI pulse in `[1000, 2000]` onto `[0, 1023]`.
pub fn rssi_from_pulse(pulse: u16, invert: bool) -> u16 {
    let mut pulse = pulse as i32;
    if invert {
        pulse = (2000 - pulse) + 1000;
    }

    let clamped = (pulse - 1000).clamp(0, 1000);
    linear_map(clamped as f32, 0., 1000., 0., RSSI_MAX_VALUE as f32) as u16
}

/// Map an RSSI percentage onto `[0, 1023]`, clamping at 100 %.
pub fn rssi_from_percentage(percentage: u16) -> u16 {
    let clamped = percentage.min(100);
    linear_map(clamped as f32, 0., 100., 0., RSSI_MAX_VALUE as f32) as u16
}

#[derive(Debug, Clone)]
pub struct RssiEstimator {
    mode: RssiMode,
    rssi: u16,
    samples: MovingAverage<RSSI_ADC_SAMPLE_COUNT>,
    update_at: u32,
}

impl RssiEstimator {
    pub fn new(mode: RssiMode) -> Self {
        Self {
            mode,
            rssi: 0,
            samples: MovingAverage::new(),
            update_at: 0,
        }
    }

    /// Latest estimate in `[0, 1023]`
    pub fn rssi(&self) -> u16 {
        self.rssi
    }

    /// Update from the published channel array, or from the analog input at
    /// no more than 50 Hz, depending on the selected mode.
    pub fn update(&mut self, now: u32, channels: &[u16], adc: &mut impl AnalogInput) {
        match self.mode {
            RssiMode::Disabled => {}
            RssiMode::Channel { channel, invert } => {
                if let Some(&pulse) = channels.get(channel) {
                    self.rssi = rssi_from_pulse(pulse, invert);
                }
            }
            RssiMode::Analog { scale } => {
                if !deadline_reached(now, self.update_at) {
                    return;
                }
                self.update_at = now.wrapping_add(DELAY_50_HZ);

                let percentage = adc.read() / scale.max(RSSI_SCALE_MIN) as u16;
                let mean = self.samples.update(percentage);
                self.rssi = rssi_from_percentage(mean);
            }
        }
    }
}
