use serde::{Deserialize, Serialize};

use crate::{consts::*, errors::ConfigError, rx::remap::RcMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features(u16);

bitflags::bitflags! {
    /// Feature switches consumed by the receiver layer. Exactly one of the
    /// `RX_*` source features is expected to be set.
    impl Features: u16 {

        /// **Bit 0** - PPM capture on a single input pin.
        const RX_PPM = 1 << 0;

        /// **Bit 1** - One capture input per channel.
        const RX_PARALLEL_PWM = 1 << 1;

        /// **Bit 2** - Frame based serial receiver (SBUS, Spektrum, ...).
        const RX_SERIAL = 1 << 2;

        /// **Bit 3** - Channels supplied over the telemetry link.
        const RX_MSP = 1 << 3;

        /// **Bit 4** - Failsafe stage 2 is handled by the failsafe manager.
        const FAILSAFE = 1 << 4;

        /// **Bit 5** - Reversible motors, throttle is centered at rest.
        const FLIGHT_3D = 1 << 5;

        /// **Bit 6** - RSSI is sampled from an analog input.
        const RSSI_ADC = 1 << 6;
    }
}

/// What a channel resolves to once its pulses have been invalid for too long.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FailsafeMode {
    /// Role dependent: centered sticks, low (or centered in 3D) throttle
    Auto = 0,
    /// Keep the last published value
    Hold = 1,
    /// Use the configured step value
    Set = 2,
    Invalid = 3,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FailsafeChannelConfig {
    pub mode: FailsafeMode,
    pub step: u8,
}

impl FailsafeChannelConfig {
    pub const fn value(&self) -> u16 {
        rxfail_step_to_channel_value(self.step)
    }
}

/// Physical input range mapped onto `[PWM_RANGE_MIN, PWM_RANGE_MAX]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelRange {
    pub min: u16,
    pub max: u16,
}

crate::const_default!(ChannelRange => {
    min: PWM_RANGE_MIN,
    max: PWM_RANGE_MAX,
});

/// Serial receiver protocols. The decoders live outside of this crate and
/// hand their frames over through a [`FrameCell`](crate::rx::handoff::FrameCell).
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialProvider {
    Spektrum1024 = 0,
    Spektrum2048 = 1,
    Sbus = 2,
    Sumd = 3,
    Sumh = 4,
    XbusModeBRj01 = 5,
    Ibus = 6,
    Srxl = 7,
}

impl SerialProvider {
    /// Native frame period of the protocol [us]
    pub const fn refresh_rate_us(&self) -> u32 {
        match self {
            SerialProvider::Spektrum1024 => 22_000,
            SerialProvider::Ibus => DEFAULT_REFRESH_RATE_US,
            _ => 11_000,
        }
    }

    /// Number of channels carried by one frame
    pub const fn channel_count(&self) -> usize {
        match self {
            SerialProvider::Spektrum1024 | SerialProvider::Spektrum2048 => 12,
            SerialProvider::Sbus => 18,
            SerialProvider::Sumd | SerialProvider::Srxl => 16,
            SerialProvider::Sumh => 8,
            SerialProvider::XbusModeBRj01 => 12,
            SerialProvider::Ibus => 10,
        }
    }
}

/// Refresh period reported when a source does not define its own [us]
pub const DEFAULT_REFRESH_RATE_US: u32 = 20_000;

/// Mode activation range of the arm switch, used to start the arm channel
/// in its OFF position.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArmSwitch {
    /// Index of the aux channel, 0 being the first channel after throttle
    pub aux_channel: u8,
    pub start_step: u8,
    pub end_step: u8,
}

impl ArmSwitch {
    pub const fn is_usable(&self) -> bool {
        self.start_step < self.end_step
    }

    /// A channel value just outside of the activation range
    pub const fn off_value(&self) -> u16 {
        if self.start_step > 0 {
            mode_step_to_channel_value(self.start_step - 1)
        } else {
            mode_step_to_channel_value(self.end_step.saturating_add(1))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxConfig {
    /// Center stick value
    pub midrc: u16,
    /// Pulses below this are invalid
    pub rx_min_usec: u16,
    /// Pulses above this are invalid
    pub rx_max_usec: u16,
    /// 1-based channel carrying RSSI, 0 disables channel RSSI
    pub rssi_channel: u8,
    pub rssi_ppm_invert: bool,
    /// Divisor turning a raw analog sample into a percentage
    pub rssi_scale: u8,
    pub rcmap: RcMap,
    pub serialrx_provider: SerialProvider,
    pub channel_ranges: [ChannelRange; NON_AUX_CHANNEL_COUNT],
    pub failsafe_channels: [FailsafeChannelConfig; MAX_SUPPORTED_RC_CHANNEL_COUNT],
    pub arm_switch: Option<ArmSwitch>,
}

crate::const_default!(RxConfig => {
    midrc: 1500,
    rx_min_usec: 885,
    rx_max_usec: 2115,
    rssi_channel: 0,
    rssi_ppm_invert: false,
    rssi_scale: RSSI_SCALE_DEFAULT,
    rcmap: RcMap::identity(),
    serialrx_provider: SerialProvider::Spektrum1024,
    channel_ranges: [ChannelRange::const_default(); NON_AUX_CHANNEL_COUNT],
    failsafe_channels: default_failsafe_channels(885, 1500),
    arm_switch: None,
});

/// Non-aux channels default to AUTO, aux channels to HOLD. Throttle stores the
/// minimum pulse, every other channel the center value.
pub const fn default_failsafe_channels(
    rx_min_usec: u16,
    midrc: u16,
) -> [FailsafeChannelConfig; MAX_SUPPORTED_RC_CHANNEL_COUNT] {
    let mut channels = [FailsafeChannelConfig {
        mode: FailsafeMode::Hold,
        step: 0,
    }; MAX_SUPPORTED_RC_CHANNEL_COUNT];

    let mut i = 0;
    while i < MAX_SUPPORTED_RC_CHANNEL_COUNT {
        if i < NON_AUX_CHANNEL_COUNT {
            channels[i].mode = FailsafeMode::Auto;
        }
        channels[i].step = if i == THROTTLE {
            channel_value_to_rxfail_step(rx_min_usec)
        } else {
            channel_value_to_rxfail_step(midrc)
        };
        i += 1;
    }

    channels
}

pub const fn rxfail_step_to_channel_value(step: u8) -> u16 {
    PWM_PULSE_MIN + RXFAIL_STEP_SIZE * step as u16
}

pub const fn channel_value_to_rxfail_step(value: u16) -> u8 {
    let value = if value < PWM_PULSE_MIN {
        PWM_PULSE_MIN
    } else if value > PWM_PULSE_MAX {
        PWM_PULSE_MAX
    } else {
        value
    };
    ((value - PWM_PULSE_MIN) / RXFAIL_STEP_SIZE) as u8
}

pub const fn mode_step_to_channel_value(step: u8) -> u16 {
    MODE_STEP_MIN_VALUE + MODE_STEP_SIZE * step as u16
}

pub trait Configuration {
    fn sanity_check(&self) -> Result<(), ConfigError>;
}

impl Configuration for RxConfig {
    fn sanity_check(&self) -> Result<(), ConfigError> {
        if self.rx_min_usec >= self.rx_max_usec
            || self.rx_min_usec < PWM_PULSE_MIN
            || self.rx_max_usec > PWM_PULSE_MAX
        {
            return Err(ConfigError::InvalidPulseBounds);
        }

        for (channel, range) in self.channel_ranges.iter().enumerate() {
            if range.min >= range.max {
                return Err(ConfigError::InvalidRange {
                    channel: channel as u8,
                });
            }
        }

        for (channel, failsafe) in self.failsafe_channels.iter().enumerate() {
            if failsafe.step > MAX_RXFAIL_RANGE_STEP {
                return Err(ConfigError::InvalidFailsafeStep {
                    channel: channel as u8,
                });
            }
        }

        if !(RSSI_SCALE_MIN..=RSSI_SCALE_MAX).contains(&self.rssi_scale) {
            return Err(ConfigError::InvalidRssiScale);
        }

        if self.rssi_channel as usize > MAX_SUPPORTED_RC_CHANNEL_COUNT {
            return Err(ConfigError::InvalidRssiChannel);
        }

        if let Some(arm) = self.arm_switch {
            if arm.aux_channel as usize >= MAX_SUPPORTED_RC_CHANNEL_COUNT - NON_AUX_CHANNEL_COUNT
                || arm.start_step > MAX_MODE_RANGE_STEP
                || arm.end_step > MAX_MODE_RANGE_STEP
            {
                return Err(ConfigError::InvalidArmSwitch);
            }
        }

        Ok(())
    }
}

impl RxConfig {
    /// Serialize the configuration for the external configuration store.
    pub fn to_slice<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], ConfigError> {
        Ok(postcard::to_slice(self, buf)?)
    }

    /// Deserialize a configuration previously written with [`RxConfig::to_slice`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        Ok(postcard::from_bytes(bytes)?)
    }

    /// Failsafe value the throttle starts at, and falls back to in AUTO mode
    pub const fn throttle_rest_value(&self, features: Features) -> u16 {
        if features.contains(Features::FLIGHT_3D) {
            self.midrc
        } else {
            self.rx_min_usec
        }
    }
}
