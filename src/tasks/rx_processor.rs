use embassy_time::{Duration, Instant, Ticker};
use portable_atomic::Ordering;

use crate::{
    rx::{failsafe::FailsafeManager, rssi::AnalogInput, Receiver},
    signals as s,
};

const ID: &str = "rx_processor";

/// How often the channel source is polled for new frames
pub const POLL_PERIOD: Duration = Duration::from_millis(1);

/// Drives a [`Receiver`] and publishes its output on the receiver signals.
pub struct RxProcessor<F, A> {
    receiver: Receiver,
    failsafe: F,
    adc: A,
    last_rssi: Option<u16>,
}

impl<F: FailsafeManager, A: AnalogInput> RxProcessor<F, A> {
    pub fn new(receiver: Receiver, failsafe: F, adc: A) -> Self {
        Self {
            receiver,
            failsafe,
            adc,
            last_rssi: None,
        }
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    pub fn suspend(&mut self, now: u32) {
        self.receiver.suspend(now, &mut self.failsafe);
    }

    pub fn resume(&mut self, now: u32) {
        self.receiver.resume(now, &mut self.failsafe);
    }

    /// Run one pass of the receiver. Returns `true` if the channels were
    /// processed and published.
    pub fn poll(&mut self, now: u32) -> bool {
        self.receiver.update(now);

        let process = self.receiver.should_process(now);
        if process {
            let failsafe_box_active = s::FAILSAFE_BOX_ACTIVE.load(Ordering::Relaxed);
            self.receiver
                .calculate_channels_and_update_failsafe(now, failsafe_box_active, &mut self.failsafe);

            s::RX_CHANNELS.sender().send(*self.receiver.channels());
            s::RX_STATUS.sender().send(self.receiver.status());
        }

        self.receiver.update_rssi(now, &mut self.adc);
        let rssi = self.receiver.rssi();
        if self.last_rssi != Some(rssi) {
            self.last_rssi = Some(rssi);
            s::RX_RSSI.sender().send(rssi);
        }

        process
    }
}

pub async fn main(receiver: Receiver, failsafe: impl FailsafeManager, adc: impl AnalogInput) -> ! {
    info!("{}: Task started", ID);

    let mut processor = RxProcessor::new(receiver, failsafe, adc);
    let mut ticker = Ticker::every(POLL_PERIOD);

    info!(
        "{}: Entering main loop, source refresh period {} us",
        ID,
        processor.receiver().refresh_rate_us()
    );
    loop {
        // The receiver works on the wrapping 32-bit microsecond clock
        let now = Instant::now().as_micros() as u32;
        processor.poll(now);
        ticker.next().await;
    }
}
