use static_assertions::const_assert;

/// Maximum number of logical channels the receiver layer tracks
pub const MAX_SUPPORTED_RC_CHANNEL_COUNT: usize = 18;

/// Roll, pitch, yaw and throttle. Range calibration and AUTO failsafe apply to these.
pub const NON_AUX_CHANNEL_COUNT: usize = 4;

/// Number of inputs which can be reordered by the channel map
pub const MAX_MAPPABLE_RX_INPUTS: usize = 8;

/// Maximum number of channels a PPM or parallel PWM capture can deliver
pub const MAX_SUPPORTED_RX_PARALLEL_PWM_OR_PPM_CHANNEL_COUNT: usize = 12;

/// Channel roles in remap order, `AERT` followed by the aux channels
pub const RC_CHANNEL_LETTERS: &str = "AERT12345678abcdefgh";

// Logical channel indices of the primary control axes
pub const ROLL: usize = 0;
pub const PITCH: usize = 1;
pub const YAW: usize = 2;
pub const THROTTLE: usize = 3;

/// Sentinel sample for "no data from the receiver yet"
pub const PPM_RCVR_TIMEOUT: u16 = 0;

// Canonical pulse domain in microseconds
pub const PWM_RANGE_MIN: u16 = 1000;
pub const PWM_RANGE_MAX: u16 = 2000;

// Hard clamp applied after calibration
pub const PWM_PULSE_MIN: u16 = 750;
pub const PWM_PULSE_MAX: u16 = 2250;

/// Failsafe fallback values are stored in steps of this many microseconds
pub const RXFAIL_STEP_SIZE: u16 = 25;
pub const MAX_RXFAIL_RANGE_STEP: u8 = ((PWM_PULSE_MAX - PWM_PULSE_MIN) / RXFAIL_STEP_SIZE) as u8;

// Mode activation ranges are stored in 25 us steps starting at 900 us
pub const MODE_STEP_MIN_VALUE: u16 = 900;
pub const MODE_STEP_SIZE: u16 = 25;
pub const MAX_MODE_RANGE_STEP: u8 = 48;

/// How long an invalid pulse is hidden behind the last good value [us]
pub const MAX_INVALID_PULSE_TIME_US: u32 = 300_000;

/// Depth of the moving average used for PPM and parallel PWM captures
pub const PPM_AND_PWM_SAMPLE_COUNT: usize = 3;

/// Depth of the moving average used for analog RSSI
pub const RSSI_ADC_SAMPLE_COUNT: usize = 16;

// Cadence constants [us]
pub const DELAY_80_HZ: u32 = 1_000_000 / 80;
pub const DELAY_50_HZ: u32 = 1_000_000 / 50;
pub const DELAY_10_HZ: u32 = 1_000_000 / 10;
pub const DELAY_5_HZ: u32 = 1_000_000 / 5;

/// Signal evaluation is suspended this long by `suspend` [us]
pub const SKIP_RC_ON_SUSPEND_PERIOD: u32 = 1_500_000;

/// Samples flushed after a suspend/resume, regardless of timing
pub const SKIP_RC_SAMPLES_ON_RESUME: u8 = 2;

// Bitmask of the channels required for flight
pub const REQUIRED_CHANNEL_MASK: u8 = (1 << NON_AUX_CHANNEL_COUNT) - 1;

// RSSI scaling
pub const RSSI_MAX_VALUE: u16 = 1023;
pub const RSSI_SCALE_MIN: u8 = 1;
pub const RSSI_SCALE_MAX: u8 = 255;
pub const RSSI_SCALE_DEFAULT: u8 = 30;

const_assert!(NON_AUX_CHANNEL_COUNT <= 8);
const_assert!(MAX_MAPPABLE_RX_INPUTS <= MAX_SUPPORTED_RC_CHANNEL_COUNT);
const_assert!(MAX_MAPPABLE_RX_INPUTS <= RC_CHANNEL_LETTERS.len());
const_assert!(MAX_SUPPORTED_RX_PARALLEL_PWM_OR_PPM_CHANNEL_COUNT <= MAX_SUPPORTED_RC_CHANNEL_COUNT);
const_assert!(MAX_SUPPORTED_RC_CHANNEL_COUNT - NON_AUX_CHANNEL_COUNT <= 16);
