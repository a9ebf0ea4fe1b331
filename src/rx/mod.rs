//! Receiver signal pipeline.
//!
//! Raw samples flow from the active [`ChannelSource`] through the channel map
//! and range calibration into the raw channel array. From there the pulse
//! validity tracker and the failsafe logic produce the published channel
//! array, which is the only thing the rest of the firmware should read.

pub mod failsafe;
pub mod handoff;
pub mod range;
pub mod remap;
pub mod rssi;
pub mod smoothing;
pub mod source;

use failsafe::{is_pulse_valid, rxfail_value, FailsafeManager, PulseHold, PulseState};
use range::apply_range;
use rssi::{AnalogInput, RssiEstimator, RssiMode};
use smoothing::ChannelSmoother;
use source::{ChannelSource, NullSource, RxSource, SourceBindings, SourceKind};

use crate::{
    consts::*,
    types::{
        config::{Features, RxConfig, DEFAULT_REFRESH_RATE_US},
        status::{FlightChannels, FrameStatus, RxStatus},
        RcChannels,
    },
    utils::time::{deadline_reached, is_after},
};

const ID: &str = "rx";

/// State of the receiver layer. Owned by a single control loop which calls
/// [`Receiver::update`], [`Receiver::should_process`] and
/// [`Receiver::calculate_channels_and_update_failsafe`] in that order.
pub struct Receiver {
    config: RxConfig,
    features: Features,
    source: RxSource,
    refresh_rate_us: u32,
    channel_count: usize,

    /// Calibrated samples, before any failsafe logic
    raw: RcChannels,
    /// Channels as published to the flight controller
    data: RcChannels,

    hold: PulseHold,
    smoother: ChannelSmoother,
    rssi: RssiEstimator,
    flight_channels: FlightChannels,

    // Signal state as reported by frame based sources
    data_received: bool,
    signal_received: bool,
    in_failsafe: bool,

    // Signal state as reported by capture based sources
    signal_received_nd: bool,
    in_failsafe_nd: bool,

    rx_update_at: u32,
    need_signal_before: u32,
    suspend_until: u32,
    skip_samples: u8,

    /// Last verdict handed to the failsafe manager, only used to log edges
    failsafe_reported: bool,
}

impl Receiver {
    /// Select and enable the channel source requested by `features`. If the
    /// board cannot provide it, the feature is cleared and the null source
    /// is used, which drives every channel into failsafe.
    pub fn new(config: RxConfig, mut features: Features, bindings: SourceBindings, now: u32) -> Self {
        let kind = SourceKind::select(features, config.serialrx_provider);
        let (source, refresh_rate_us) = match RxSource::init(kind, bindings) {
            Ok(source) => source,
            Err(err) => {
                error!("{}: {}, falling back to the null source", ID, err);
                features.remove(kind.feature());
                (RxSource::Null(NullSource), DEFAULT_REFRESH_RATE_US)
            }
        };

        let mut data = [config.midrc; MAX_SUPPORTED_RC_CHANNEL_COUNT];
        data[THROTTLE] = config.throttle_rest_value(features);

        // Start the arm switch in a position which cannot arm
        if let Some(arm) = config.arm_switch.filter(|arm| arm.is_usable()) {
            if let Some(channel) = data.get_mut(NON_AUX_CHANNEL_COUNT + arm.aux_channel as usize) {
                *channel = arm.off_value();
            }
        }

        let rssi = RssiEstimator::new(RssiMode::select(&config, features));

        Self {
            channel_count: source.channel_count(),
            source,
            refresh_rate_us,
            raw: [PPM_RCVR_TIMEOUT; MAX_SUPPORTED_RC_CHANNEL_COUNT],
            data,
            hold: PulseHold::new(now),
            smoother: ChannelSmoother::new(),
            rssi,
            flight_channels: FlightChannels::empty(),
            data_received: false,
            signal_received: false,
            in_failsafe: true,
            signal_received_nd: false,
            in_failsafe_nd: true,
            rx_update_at: 0,
            need_signal_before: 0,
            suspend_until: 0,
            skip_samples: 0,
            failsafe_reported: false,
            config,
            features,
        }
    }

    /// Poll the channel source for new frames or capture activity, and expire
    /// the signal if nothing arrived before its deadline.
    pub fn update(&mut self, now: u32) {
        if self.signal_received && deadline_reached(now, self.need_signal_before) {
            self.signal_received = false;
            self.signal_received_nd = false;
        }

        let data_driven = self.source.is_data_driven();
        if data_driven {
            self.data_received = false;
        }

        let status = self.source.frame_status();
        if !status.contains(FrameStatus::COMPLETE) {
            return;
        }

        if data_driven {
            self.data_received = true;
            self.in_failsafe = status.contains(FrameStatus::FAILSAFE);
            self.signal_received = !self.in_failsafe;
        } else {
            self.signal_received_nd = true;
            self.in_failsafe_nd = false;
        }

        self.need_signal_before = now.wrapping_add(self.source.signal_timeout_us());
    }

    /// Returns `true` if a new frame arrived, or the 80 Hz update deadline passed.
    pub fn should_process(&self, now: u32) -> bool {
        self.data_received || deadline_reached(now, self.rx_update_at)
    }

    /// Read, calibrate and validate every channel, then decide whether this
    /// cycle is safe to fly. The verdict is reported to `failsafe` every cycle.
    pub fn calculate_channels_and_update_failsafe(
        &mut self,
        now: u32,
        failsafe_box_active: bool,
        failsafe: &mut impl FailsafeManager,
    ) {
        self.rx_update_at = now.wrapping_add(DELAY_80_HZ);

        // Flush samples around a suspension, but only once its window has passed
        if self.skip_samples > 0 {
            if is_after(now, self.suspend_until) {
                self.skip_samples -= 1;
            }
            return;
        }

        self.read_channels_apply_ranges();
        self.detect_and_apply_signal_loss(now, failsafe_box_active, failsafe);
    }

    fn read_channels_apply_ranges(&mut self) {
        for channel in 0..self.channel_count {
            let physical = self.config.rcmap.remap(channel);
            let mut sample = self.source.read_raw(physical);

            // Only the primary channels carry a calibration
            if let Some(range) = self.config.channel_ranges.get(channel) {
                sample = apply_range(sample, range);
            }

            self.raw[channel] = sample;
        }
    }

    fn detect_and_apply_signal_loss(
        &mut self,
        now: u32,
        failsafe_box_active: bool,
        failsafe: &mut impl FailsafeManager,
    ) {
        let data_driven = self.source.is_data_driven();
        if !data_driven {
            self.signal_received = self.signal_received_nd;
            self.in_failsafe = self.in_failsafe_nd;
        }

        let use_rx_values = self.signal_received && !self.in_failsafe;

        trace!(
            "{}: signal {}, failsafe {}, raw roll {}",
            ID,
            self.signal_received,
            self.in_failsafe,
            self.source.read_raw(ROLL)
        );

        self.flight_channels = FlightChannels::all();

        for channel in 0..self.channel_count {
            let sample = if use_rx_values { self.raw[channel] } else { PPM_RCVR_TIMEOUT };

            let valid = is_pulse_valid(sample, &self.config);
            let sample = match self.hold.evaluate(channel, valid, now) {
                PulseState::Valid => sample,
                PulseState::Holding => self.data[channel],
                PulseState::Expired => {
                    self.flight_channels.mark_bad(channel);
                    rxfail_value(channel, &self.config, self.features, self.data[channel])
                }
            };

            self.data[channel] = if data_driven {
                sample
            } else {
                self.smoother.apply(channel, sample)
            };
        }

        let flight_channels_valid = self.flight_channels.all_valid();
        let failsafe_switch = failsafe_box_active && self.features.contains(Features::FAILSAFE);

        if flight_channels_valid && !failsafe_switch {
            failsafe.on_valid_data_received();

            if self.failsafe_reported {
                self.failsafe_reported = false;
                info!("{}: Valid channels received, leaving failsafe", ID);
            }
        } else {
            self.in_failsafe = true;
            self.in_failsafe_nd = true;
            failsafe.on_valid_data_failed();

            for channel in 0..self.channel_count {
                self.data[channel] = rxfail_value(channel, &self.config, self.features, self.data[channel]);
            }

            if !self.failsafe_reported {
                self.failsafe_reported = true;
                warn!(
                    "{}: Entering failsafe, flight channels {}, failsafe switch {}",
                    ID,
                    self.flight_channels.bits(),
                    failsafe_switch
                );
            }
        }

        trace!("{}: published throttle {}", ID, self.data[THROTTLE]);
    }

    /// Pause signal evaluation, e.g. during a blocking operation which starves
    /// the control loop.
    pub fn suspend(&mut self, now: u32, failsafe: &mut impl FailsafeManager) {
        self.suspend_until = now.wrapping_add(SKIP_RC_ON_SUSPEND_PERIOD);
        self.skip_samples = SKIP_RC_SAMPLES_ON_RESUME;
        failsafe.on_rx_suspend(SKIP_RC_ON_SUSPEND_PERIOD);
        info!("{}: Signal evaluation suspended", ID);
    }

    /// End a suspension early. The next samples are still flushed.
    pub fn resume(&mut self, now: u32, failsafe: &mut impl FailsafeManager) {
        self.suspend_until = now;
        self.skip_samples = SKIP_RC_SAMPLES_ON_RESUME;
        failsafe.on_rx_resume();
        info!("{}: Signal evaluation resumed", ID);
    }

    /// Update the RSSI estimate, either from the published channels or from
    /// the analog input.
    pub fn update_rssi(&mut self, now: u32, adc: &mut impl AnalogInput) {
        self.rssi.update(now, &self.data, adc);
    }

    /// Channels as published to the flight controller
    pub fn channels(&self) -> &RcChannels {
        &self.data
    }

    /// Calibrated channels before validation
    pub fn raw_channels(&self) -> &RcChannels {
        &self.raw
    }

    pub fn is_receiving_signal(&self) -> bool {
        self.signal_received
    }

    pub fn is_in_failsafe(&self) -> bool {
        self.in_failsafe
    }

    /// Whether every required channel was valid in the last processed cycle
    pub fn are_flight_channels_valid(&self) -> bool {
        self.flight_channels.all_valid()
    }

    pub fn rssi(&self) -> u16 {
        self.rssi.rssi()
    }

    /// Native frame period of the active source [us]
    pub fn refresh_rate_us(&self) -> u32 {
        self.refresh_rate_us
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Features in effect, with the source feature cleared if it failed to start
    pub fn features(&self) -> Features {
        self.features
    }

    pub fn config(&self) -> &RxConfig {
        &self.config
    }

    pub fn status(&self) -> RxStatus {
        RxStatus {
            signal_received: self.signal_received,
            failsafe: self.in_failsafe,
            flight_channels_valid: self.are_flight_channels_valid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        logging::init_test_logger,
        rx::handoff::{CaptureBuffer, Frame, FrameCell},
        types::config::{ArmSwitch, FailsafeChannelConfig, FailsafeMode, SerialProvider},
    };

    const CYCLE_US: u32 = 10_000;

    #[derive(Default)]
    struct Recorder {
        received: usize,
        failed: usize,
        suspended: Option<u32>,
        resumed: usize,
    }

    impl FailsafeManager for Recorder {
        fn on_valid_data_received(&mut self) {
            self.received += 1;
        }

        fn on_valid_data_failed(&mut self) {
            self.failed += 1;
        }

        fn on_rx_suspend(&mut self, duration_us: u32) {
            self.suspended = Some(duration_us);
        }

        fn on_rx_resume(&mut self) {
            self.resumed += 1;
        }
    }

    fn sbus_receiver(frames: &'static FrameCell, features: Features) -> Receiver {
        init_test_logger();
        let mut config = RxConfig::default();
        config.serialrx_provider = SerialProvider::Sbus;
        let bindings = SourceBindings {
            capture: None,
            frames: Some(frames),
        };
        Receiver::new(config, features | Features::RX_SERIAL, bindings, 0)
    }

    fn frame(roll: u16) -> Frame {
        let mut frame = Frame {
            channels: [1500; MAX_SUPPORTED_RC_CHANNEL_COUNT],
            failsafe: false,
        };
        frame.channels[ROLL] = roll;
        frame.channels[THROTTLE] = 1100;
        frame
    }

    /// One pass of the control loop. Returns `true` if the channels were processed.
    fn step(rx: &mut Receiver, now: u32, failsafe: &mut Recorder) -> bool {
        rx.update(now);
        let process = rx.should_process(now);
        if process {
            rx.calculate_channels_and_update_failsafe(now, false, failsafe);
        }
        process
    }

    #[test]
    fn test_initial_values() {
        init_test_logger();
        let rx = Receiver::new(RxConfig::default(), Features::empty(), SourceBindings::default(), 0);
        assert_eq!(rx.channels()[ROLL], 1500);
        assert_eq!(rx.channels()[THROTTLE], 885);
        assert_eq!(rx.channels()[17], 1500);
        assert!(!rx.is_receiving_signal());
        assert!(rx.is_in_failsafe());

        let rx = Receiver::new(RxConfig::default(), Features::FLIGHT_3D, SourceBindings::default(), 0);
        assert_eq!(rx.channels()[THROTTLE], 1500);
    }

    #[test]
    fn test_arm_switch_starts_off() {
        init_test_logger();
        let mut config = RxConfig::default();
        config.arm_switch = Some(ArmSwitch {
            aux_channel: 1,
            start_step: 0,
            end_step: 20,
        });

        let rx = Receiver::new(config.clone(), Features::empty(), SourceBindings::default(), 0);
        assert_eq!(rx.channels()[NON_AUX_CHANNEL_COUNT + 1], 900 + 25 * 21);

        // An empty activation range leaves the channel centered
        config.arm_switch = Some(ArmSwitch {
            aux_channel: 1,
            start_step: 20,
            end_step: 20,
        });
        let rx = Receiver::new(config, Features::empty(), SourceBindings::default(), 0);
        assert_eq!(rx.channels()[NON_AUX_CHANNEL_COUNT + 1], 1500);
    }

    #[test]
    fn test_unavailable_source_falls_back_to_null() {
        init_test_logger();
        let features = Features::RX_SERIAL | Features::FAILSAFE;
        let mut rx = Receiver::new(RxConfig::default(), features, SourceBindings::default(), 0);

        assert_eq!(rx.features(), Features::FAILSAFE);
        assert_eq!(rx.refresh_rate_us(), DEFAULT_REFRESH_RATE_US);
        assert_eq!(rx.channel_count(), MAX_SUPPORTED_RC_CHANNEL_COUNT);

        // Without any source the channels end up in failsafe once the hold expires
        let mut failsafe = Recorder::default();
        let mut now = 0;
        while now <= MAX_INVALID_PULSE_TIME_US + CYCLE_US {
            step(&mut rx, now, &mut failsafe);
            now += CYCLE_US;
        }

        assert!(failsafe.failed > 0);
        assert!(!rx.are_flight_channels_valid());
        assert_eq!(rx.channels()[THROTTLE], 885);
    }

    #[test]
    fn test_valid_frames_report_valid_data_every_cycle() {
        static FRAMES: FrameCell = FrameCell::new();
        let mut rx = sbus_receiver(&FRAMES, Features::FAILSAFE);
        let mut failsafe = Recorder::default();

        let mut cycles = 0;
        let mut now = 0;
        while now < 1_000_000 {
            FRAMES.publish(frame(1800));
            assert!(step(&mut rx, now, &mut failsafe));
            assert!(rx.are_flight_channels_valid());
            assert!(rx.is_receiving_signal());
            cycles += 1;
            now += CYCLE_US;
        }

        assert_eq!(failsafe.received, cycles);
        assert_eq!(failsafe.failed, 0);
        assert_eq!(rx.channels()[ROLL], 1800);
        assert_eq!(rx.channels()[THROTTLE], 1100);
        assert_eq!(rx.status(), RxStatus {
            signal_received: true,
            failsafe: false,
            flight_channels_valid: true,
        });
    }

    #[test]
    fn test_lost_frames_hold_then_failsafe() {
        static FRAMES: FrameCell = FrameCell::new();
        let mut rx = sbus_receiver(&FRAMES, Features::empty());
        let mut failsafe = Recorder::default();

        let mut now = 0;
        while now <= 500_000 {
            FRAMES.publish(frame(1800));
            step(&mut rx, now, &mut failsafe);
            now += CYCLE_US;
        }
        let last_frame = now - CYCLE_US;

        // The signal expires at the 10 Hz deadline
        while now < last_frame + DELAY_10_HZ {
            step(&mut rx, now, &mut failsafe);
            assert!(rx.is_receiving_signal());
            now += CYCLE_US;
        }
        step(&mut rx, now, &mut failsafe);
        assert!(!rx.is_receiving_signal());

        // Channels hold their last value until the invalid pulse window ends
        while now < last_frame + MAX_INVALID_PULSE_TIME_US - CYCLE_US {
            now += CYCLE_US;
            step(&mut rx, now, &mut failsafe);
            assert_eq!(rx.channels()[ROLL], 1800);
            assert!(rx.are_flight_channels_valid());
        }
        assert_eq!(failsafe.failed, 0);

        // The last frame is still read until the signal expires, so the hold window starts there
        while now < last_frame + DELAY_10_HZ + MAX_INVALID_PULSE_TIME_US + 2 * DELAY_80_HZ {
            now += CYCLE_US;
            step(&mut rx, now, &mut failsafe);
        }

        assert!(failsafe.failed > 0);
        assert!(!rx.are_flight_channels_valid());
        assert!(rx.is_in_failsafe());
        assert_eq!(rx.channels()[ROLL], 1500);
        assert_eq!(rx.channels()[THROTTLE], 885);

        // Aux channels hold by default
        assert_eq!(rx.channels()[NON_AUX_CHANNEL_COUNT], 1500);
    }

    #[test]
    fn test_flight_channels_recomputed_every_cycle() {
        static FRAMES: FrameCell = FrameCell::new();
        let mut rx = sbus_receiver(&FRAMES, Features::FAILSAFE);
        let mut failsafe = Recorder::default();

        let mut now = 0;
        FRAMES.publish(frame(1500));
        step(&mut rx, now, &mut failsafe);
        assert!(rx.are_flight_channels_valid());

        // Yaw drops out while the other channels keep arriving
        let mut broken = frame(1500);
        broken.channels[YAW] = PPM_RCVR_TIMEOUT;
        while now < MAX_INVALID_PULSE_TIME_US {
            now += CYCLE_US;
            FRAMES.publish(broken);
            step(&mut rx, now, &mut failsafe);
        }

        assert!(!rx.are_flight_channels_valid());
        assert_eq!(failsafe.failed, 1);
        assert!(rx.is_in_failsafe());

        // A single good frame restores the yaw bit
        now += CYCLE_US;
        FRAMES.publish(frame(1500));
        step(&mut rx, now, &mut failsafe);
        assert!(rx.are_flight_channels_valid());
        assert!(!rx.is_in_failsafe());
    }

    #[test]
    fn test_failsafe_switch_overrides_valid_channels() {
        static FRAMES: FrameCell = FrameCell::new();
        let mut rx = sbus_receiver(&FRAMES, Features::FAILSAFE);
        rx.config.failsafe_channels[5] = FailsafeChannelConfig {
            mode: FailsafeMode::Set,
            step: 50,
        };
        let mut failsafe = Recorder::default();

        FRAMES.publish(frame(1800));
        rx.update(0);
        rx.calculate_channels_and_update_failsafe(0, true, &mut failsafe);

        assert_eq!(failsafe.failed, 1);
        assert!(rx.are_flight_channels_valid());
        assert_eq!(rx.channels()[ROLL], 1500);
        assert_eq!(rx.channels()[THROTTLE], 885);
        assert_eq!(rx.channels()[5], 2000);

        // The switch is ignored without stage 2 failsafe
        let mut rx = sbus_receiver(&FRAMES, Features::empty());
        FRAMES.publish(frame(1800));
        rx.update(0);
        rx.calculate_channels_and_update_failsafe(0, true, &mut failsafe);
        assert_eq!(failsafe.received, 1);
    }

    #[test]
    fn test_receiver_failsafe_frames_are_not_used() {
        static FRAMES: FrameCell = FrameCell::new();
        let mut rx = sbus_receiver(&FRAMES, Features::empty());
        let mut failsafe = Recorder::default();

        FRAMES.publish(frame(1800));
        step(&mut rx, 0, &mut failsafe);
        assert_eq!(rx.channels()[ROLL], 1800);

        FRAMES.publish(Frame {
            failsafe: true,
            ..frame(1200)
        });
        step(&mut rx, CYCLE_US, &mut failsafe);

        // The flagged frame is ignored and roll is held
        assert!(!rx.is_receiving_signal());
        assert!(rx.is_in_failsafe());
        assert_eq!(rx.channels()[ROLL], 1800);
    }

    #[test]
    fn test_calibration_and_remap() {
        static FRAMES: FrameCell = FrameCell::new();
        init_test_logger();
        let mut config = RxConfig::default();
        config.serialrx_provider = SerialProvider::Sbus;
        config.rcmap = remap::RcMap::parse("TAER1234");
        config.channel_ranges[THROTTLE].min = 1100;
        config.channel_ranges[THROTTLE].max = 1900;
        let bindings = SourceBindings {
            capture: None,
            frames: Some(&FRAMES),
        };
        let mut rx = Receiver::new(config, Features::RX_SERIAL, bindings, 0);
        let mut failsafe = Recorder::default();

        // Throttle arrives on the first physical input
        let mut frame = frame(1500);
        frame.channels[0] = 1100;
        frame.channels[1] = 1600;
        FRAMES.publish(frame);
        step(&mut rx, 0, &mut failsafe);

        assert_eq!(rx.raw_channels()[THROTTLE], 1000);
        assert_eq!(rx.raw_channels()[ROLL], 1600);
        assert_eq!(rx.channels()[THROTTLE], 1000);
    }

    #[test]
    fn test_capture_source_is_smoothed() {
        static CAPTURE: CaptureBuffer = CaptureBuffer::new();
        init_test_logger();
        let bindings = SourceBindings {
            capture: Some(&CAPTURE),
            frames: None,
        };
        let mut rx = Receiver::new(RxConfig::default(), Features::RX_PPM, bindings, 0);
        let mut failsafe = Recorder::default();
        assert_eq!(rx.channel_count(), MAX_SUPPORTED_RX_PARALLEL_PWM_OR_PPM_CHANNEL_COUNT);

        for channel in 0..NON_AUX_CHANNEL_COUNT {
            CAPTURE.set_pulse(channel, 1500);
        }

        let mut now = 0;
        let mut published = [0; 4];
        for (i, roll) in [1000, 1100, 1300, 1301].into_iter().enumerate() {
            CAPTURE.set_pulse(ROLL, roll);
            CAPTURE.mark_received();
            rx.update(now);
            rx.calculate_channels_and_update_failsafe(now, false, &mut failsafe);
            published[i] = rx.channels()[ROLL];
            now += DELAY_80_HZ;
        }

        assert_eq!(published, [1000, 1100, 1133, 1233]);
        assert!(rx.is_receiving_signal());
        assert_eq!(failsafe.failed, 0);
    }

    #[test]
    fn test_capture_loss_hold_then_failsafe() {
        static CAPTURE: CaptureBuffer = CaptureBuffer::new();
        init_test_logger();
        let bindings = SourceBindings {
            capture: Some(&CAPTURE),
            frames: None,
        };
        let mut rx = Receiver::new(RxConfig::default(), Features::RX_PPM, bindings, 0);
        let mut failsafe = Recorder::default();

        for channel in 0..rx.channel_count() {
            CAPTURE.set_pulse(channel, 1600);
        }

        let mut now = 0;
        while now <= 200_000 {
            CAPTURE.mark_received();
            step(&mut rx, now, &mut failsafe);
            assert!(rx.is_receiving_signal());
            now += CYCLE_US;
        }
        let last_capture = now - CYCLE_US;
        assert_eq!(rx.channels()[ROLL], 1600);

        // Capture activity expires at the 10 Hz deadline
        while now < last_capture + DELAY_10_HZ {
            step(&mut rx, now, &mut failsafe);
            assert!(rx.is_receiving_signal());
            now += CYCLE_US;
        }
        step(&mut rx, now, &mut failsafe);
        assert!(!rx.is_receiving_signal());
        let lost_at = now;

        // Channels hold their last value, then fall to their failsafe values
        while failsafe.failed == 0 {
            assert!(now < lost_at + MAX_INVALID_PULSE_TIME_US + DELAY_80_HZ);
            assert_eq!(rx.channels()[ROLL], 1600);
            assert!(rx.are_flight_channels_valid());
            now += CYCLE_US;
            step(&mut rx, now, &mut failsafe);
        }
        assert!(now >= lost_at + MAX_INVALID_PULSE_TIME_US - 2 * DELAY_80_HZ);
        assert!(rx.is_in_failsafe());
        assert!(!rx.are_flight_channels_valid());
        assert_eq!(rx.channels()[ROLL], 1500);
        assert_eq!(rx.channels()[THROTTLE], 885);

        // Once capture resumes the smoother settles back on the input
        let mut processed = 0;
        while processed < PPM_AND_PWM_SAMPLE_COUNT {
            now += CYCLE_US;
            CAPTURE.mark_received();
            if step(&mut rx, now, &mut failsafe) {
                processed += 1;
            }
        }

        assert!(rx.is_receiving_signal());
        assert!(!rx.is_in_failsafe());
        assert!(rx.are_flight_channels_valid());
        assert_eq!(rx.channels()[ROLL], 1600);
        assert_eq!(rx.channels()[THROTTLE], 1600);
    }

    #[test]
    fn test_link_signal_outlives_serial_deadline() {
        static FRAMES: FrameCell = FrameCell::new();
        init_test_logger();
        let bindings = SourceBindings {
            capture: None,
            frames: Some(&FRAMES),
        };
        let mut rx = Receiver::new(RxConfig::default(), Features::RX_MSP, bindings, 0);

        FRAMES.publish(frame(1600));
        rx.update(0);
        assert!(rx.is_receiving_signal());

        // A single link frame keeps the signal alive past the 10 Hz serial deadline
        let mut now = 0;
        while now + CYCLE_US < DELAY_5_HZ {
            now += CYCLE_US;
            rx.update(now);
            assert!(rx.is_receiving_signal());
        }
        assert!(now > DELAY_10_HZ);

        now += CYCLE_US;
        assert_eq!(now, DELAY_5_HZ);
        rx.update(now);
        assert!(!rx.is_receiving_signal());
    }

    #[test]
    fn test_suspend_skips_samples() {
        static FRAMES: FrameCell = FrameCell::new();
        let mut rx = sbus_receiver(&FRAMES, Features::empty());
        let mut failsafe = Recorder::default();

        FRAMES.publish(frame(1800));
        step(&mut rx, 0, &mut failsafe);

        rx.suspend(0, &mut failsafe);
        assert_eq!(failsafe.suspended, Some(SKIP_RC_ON_SUSPEND_PERIOD));

        // Nothing is processed during the suspension window
        FRAMES.publish(frame(1200));
        rx.update(CYCLE_US);
        rx.calculate_channels_and_update_failsafe(CYCLE_US, false, &mut failsafe);
        assert_eq!(rx.channels()[ROLL], 1800);
        assert_eq!(failsafe.received, 1);

        // Two more samples are dropped once it has passed
        let mut now = SKIP_RC_ON_SUSPEND_PERIOD + 1;
        for _ in 0..SKIP_RC_SAMPLES_ON_RESUME {
            FRAMES.publish(frame(1200));
            rx.update(now);
            rx.calculate_channels_and_update_failsafe(now, false, &mut failsafe);
            assert_eq!(rx.channels()[ROLL], 1800);
            now += CYCLE_US;
        }

        FRAMES.publish(frame(1200));
        rx.update(now);
        rx.calculate_channels_and_update_failsafe(now, false, &mut failsafe);
        assert_eq!(rx.channels()[ROLL], 1200);
        assert_eq!(failsafe.received, 2);
    }

    #[test]
    fn test_resume_ends_suspension_early() {
        static FRAMES: FrameCell = FrameCell::new();
        let mut rx = sbus_receiver(&FRAMES, Features::empty());
        let mut failsafe = Recorder::default();

        rx.suspend(0, &mut failsafe);
        rx.resume(CYCLE_US, &mut failsafe);
        assert_eq!(failsafe.resumed, 1);

        let mut now = 2 * CYCLE_US;
        for _ in 0..SKIP_RC_SAMPLES_ON_RESUME {
            rx.calculate_channels_and_update_failsafe(now, false, &mut failsafe);
            now += CYCLE_US;
        }
        assert_eq!(failsafe.received + failsafe.failed, 0);

        FRAMES.publish(frame(1700));
        rx.update(now);
        rx.calculate_channels_and_update_failsafe(now, false, &mut failsafe);
        assert_eq!(rx.channels()[ROLL], 1700);
    }

    #[test]
    fn test_process_gate() {
        static FRAMES: FrameCell = FrameCell::new();
        let mut rx = sbus_receiver(&FRAMES, Features::empty());
        let mut failsafe = Recorder::default();

        rx.update(0);
        assert!(rx.should_process(0));
        rx.calculate_channels_and_update_failsafe(0, false, &mut failsafe);

        rx.update(1_000);
        assert!(!rx.should_process(1_000));
        assert!(rx.should_process(DELAY_80_HZ));

        // A new frame is processed right away
        FRAMES.publish(frame(1500));
        rx.update(2_000);
        assert!(rx.should_process(2_000));
    }

    #[test]
    fn test_rssi_from_channel() {
        static FRAMES: FrameCell = FrameCell::new();
        init_test_logger();
        let mut config = RxConfig::default();
        config.serialrx_provider = SerialProvider::Sbus;
        config.rssi_channel = 8;
        let bindings = SourceBindings {
            capture: None,
            frames: Some(&FRAMES),
        };
        let mut rx = Receiver::new(config, Features::RX_SERIAL, bindings, 0);
        let mut failsafe = Recorder::default();

        let mut frame = frame(1500);
        frame.channels[7] = 2000;
        FRAMES.publish(frame);
        step(&mut rx, 0, &mut failsafe);

        rx.update_rssi(0, &mut || 0);
        assert_eq!(rx.rssi(), 1023);
    }
}
