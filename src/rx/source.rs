use serde::{Deserialize, Serialize};

use super::handoff::{CaptureBuffer, FrameCell};
use crate::{
    consts::*,
    errors::RxError,
    types::{
        config::{Features, SerialProvider, DEFAULT_REFRESH_RATE_US},
        status::FrameStatus,
        RcChannels,
    },
};

const ID: &str = "rx_source";

/// Channel count of a parallel PWM receiver, one capture input per channel
pub const MAX_SUPPORTED_RC_PARALLEL_PWM_CHANNEL_COUNT: usize = 8;

/// Refresh period of PPM, parallel PWM and link sources [us]
const CAPTURE_REFRESH_RATE_US: u32 = 20_000;
const LINK_REFRESH_RATE_US: u32 = 20_000;

/// Interface of everything that can supply raw channel samples.
pub trait ChannelSource {
    /// Latest raw sample of a physical channel, [`PPM_RCVR_TIMEOUT`] if none exists.
    fn read_raw(&self, channel: usize) -> u16;

    /// Poll for new data. Data driven sources report each received frame
    /// exactly once, continuously sampled sources report capture activity.
    fn frame_status(&mut self) -> FrameStatus;

    /// Whether new data arrives as discrete frames.
    fn is_data_driven(&self) -> bool;

    /// Number of logical channels this source delivers
    fn channel_count(&self) -> usize;

    /// How long a received frame keeps the signal alive [us]
    fn signal_timeout_us(&self) -> u32;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SourceKind {
    Null,
    Ppm,
    ParallelPwm,
    Serial(SerialProvider),
    Link,
}

impl SourceKind {
    /// Feature bit which selected this source
    pub fn feature(&self) -> Features {
        match self {
            SourceKind::Null => Features::empty(),
            SourceKind::Ppm => Features::RX_PPM,
            SourceKind::ParallelPwm => Features::RX_PARALLEL_PWM,
            SourceKind::Serial(_) => Features::RX_SERIAL,
            SourceKind::Link => Features::RX_MSP,
        }
    }

    /// Pick the source requested by the feature set.
    pub fn select(features: Features, provider: SerialProvider) -> SourceKind {
        let requested = features
            & (Features::RX_SERIAL | Features::RX_MSP | Features::RX_PPM | Features::RX_PARALLEL_PWM);
        if requested.bits().count_ones() > 1 {
            warn!("{}: Multiple receiver features enabled, using the first", ID);
        }

        if features.contains(Features::RX_SERIAL) {
            SourceKind::Serial(provider)
        } else if features.contains(Features::RX_MSP) {
            SourceKind::Link
        } else if features.contains(Features::RX_PPM) {
            SourceKind::Ppm
        } else if features.contains(Features::RX_PARALLEL_PWM) {
            SourceKind::ParallelPwm
        } else {
            SourceKind::Null
        }
    }
}

/// The handoff cells a board provides to the receiver. Only the one matching
/// the configured source is needed.
#[derive(Clone, Copy, Default)]
pub struct SourceBindings {
    pub capture: Option<&'static CaptureBuffer>,
    pub frames: Option<&'static FrameCell>,
}

/// Source used when nothing else could be enabled. Always times out.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSource;

impl ChannelSource for NullSource {
    fn read_raw(&self, _channel: usize) -> u16 {
        PPM_RCVR_TIMEOUT
    }

    fn frame_status(&mut self) -> FrameStatus {
        FrameStatus::PENDING
    }

    fn is_data_driven(&self) -> bool {
        true
    }

    fn channel_count(&self) -> usize {
        MAX_SUPPORTED_RC_CHANNEL_COUNT
    }

    fn signal_timeout_us(&self) -> u32 {
        DELAY_10_HZ
    }
}

/// PPM or parallel PWM capture, continuously sampled.
pub struct CaptureSource {
    capture: &'static CaptureBuffer,
    ppm: bool,
}

impl CaptureSource {
    pub fn ppm(capture: &'static CaptureBuffer) -> Self {
        Self { capture, ppm: true }
    }

    pub fn parallel_pwm(capture: &'static CaptureBuffer) -> Self {
        Self {
            capture,
            ppm: false,
        }
    }
}

impl ChannelSource for CaptureSource {
    fn read_raw(&self, channel: usize) -> u16 {
        self.capture.pulse(channel)
    }

    fn frame_status(&mut self) -> FrameStatus {
        // PPM reports completed frames, parallel PWM reports any live input
        let receiving = if self.ppm {
            self.capture.take_received()
        } else {
            self.capture.any_pulse()
        };

        if receiving {
            FrameStatus::COMPLETE
        } else {
            FrameStatus::PENDING
        }
    }

    fn is_data_driven(&self) -> bool {
        false
    }

    fn channel_count(&self) -> usize {
        if self.ppm {
            MAX_SUPPORTED_RX_PARALLEL_PWM_OR_PPM_CHANNEL_COUNT
        } else {
            MAX_SUPPORTED_RC_PARALLEL_PWM_CHANNEL_COUNT
        }
    }

    fn signal_timeout_us(&self) -> u32 {
        DELAY_10_HZ
    }
}

/// Frames handed over by a serial decoder or the telemetry link.
pub struct FrameSource {
    cell: &'static FrameCell,
    channels: RcChannels,
    channel_count: usize,
    /// Link frames carry no failsafe flag and have a slower deadline
    link: bool,
}

impl FrameSource {
    pub fn serial(cell: &'static FrameCell, provider: SerialProvider) -> Self {
        Self {
            cell,
            channels: [PPM_RCVR_TIMEOUT; MAX_SUPPORTED_RC_CHANNEL_COUNT],
            channel_count: provider.channel_count(),
            link: false,
        }
    }

    pub fn link(cell: &'static FrameCell) -> Self {
        Self {
            cell,
            channels: [PPM_RCVR_TIMEOUT; MAX_SUPPORTED_RC_CHANNEL_COUNT],
            channel_count: MAX_SUPPORTED_RC_CHANNEL_COUNT,
            link: true,
        }
    }
}

impl ChannelSource for FrameSource {
    fn read_raw(&self, channel: usize) -> u16 {
        self.channels.get(channel).copied().unwrap_or(PPM_RCVR_TIMEOUT)
    }

    fn frame_status(&mut self) -> FrameStatus {
        let Some(frame) = self.cell.take() else {
            return FrameStatus::PENDING;
        };

        self.channels = frame.channels;
        if frame.failsafe && !self.link {
            FrameStatus::COMPLETE | FrameStatus::FAILSAFE
        } else {
            FrameStatus::COMPLETE
        }
    }

    fn is_data_driven(&self) -> bool {
        true
    }

    fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn signal_timeout_us(&self) -> u32 {
        if self.link {
            DELAY_5_HZ
        } else {
            DELAY_10_HZ
        }
    }
}

/// The active channel source, selected once at startup.
pub enum RxSource {
    Null(NullSource),
    Capture(CaptureSource),
    Frame(FrameSource),
}

impl RxSource {
    /// Enable the requested source. Returns the source and its native refresh
    /// period, or an error if the board did not provide the required handoff.
    pub fn init(kind: SourceKind, bindings: SourceBindings) -> Result<(RxSource, u32), RxError> {
        let unavailable = RxError::SourceUnavailable(kind);
        let source = match kind {
            SourceKind::Null => (RxSource::Null(NullSource), DEFAULT_REFRESH_RATE_US),
            SourceKind::Ppm => {
                let capture = bindings.capture.ok_or(unavailable)?;
                (RxSource::Capture(CaptureSource::ppm(capture)), CAPTURE_REFRESH_RATE_US)
            }
            SourceKind::ParallelPwm => {
                let capture = bindings.capture.ok_or(unavailable)?;
                (RxSource::Capture(CaptureSource::parallel_pwm(capture)), CAPTURE_REFRESH_RATE_US)
            }
            SourceKind::Serial(provider) => {
                let frames = bindings.frames.ok_or(unavailable)?;
                (RxSource::Frame(FrameSource::serial(frames, provider)), provider.refresh_rate_us())
            }
            SourceKind::Link => {
                let frames = bindings.frames.ok_or(unavailable)?;
                (RxSource::Frame(FrameSource::link(frames)), LINK_REFRESH_RATE_US)
            }
        };

        info!("{}: Enabled {:?} source", ID, kind);
        Ok(source)
    }

    fn inner(&self) -> &dyn ChannelSource {
        match self {
            RxSource::Null(source) => source,
            RxSource::Capture(source) => source,
            RxSource::Frame(source) => source,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ChannelSource {
        match self {
            RxSource::Null(source) => source,
            RxSource::Capture(source) => source,
            RxSource::Frame(source) => source,
        }
    }
}

impl ChannelSource for RxSource {
    fn read_raw(&self, channel: usize) -> u16 {
        self.inner().read_raw(channel)
    }

    fn frame_status(&mut self) -> FrameStatus {
        self.inner_mut().frame_status()
    }

    fn is_data_driven(&self) -> bool {
        self.inner().is_data_driven()
    }

    fn channel_count(&self) -> usize {
        self.inner().channel_count().min(MAX_SUPPORTED_RC_CHANNEL_COUNT)
    }

    fn signal_timeout_us(&self) -> u32 {
        self.inner().signal_timeout_us()
    }
}
