//! Feeds touch frames and force samples into the haptics.

use std::sync::Arc;
use std::time::Duration;

use anapad_core::prelude::{Anapad, AnapadResult, PollFailure};
use anapad_polling::{PollingThread, StopToken, Subscription};
use anapad_touchscreen::TouchFrame;
use crossbeam::channel::RecvTimeoutError;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, warn};

const THREAD_NAME: &str = "feedback-bridge";

/// Longest wait for a touch frame before the stop flag and failure
/// subscriptions are checked again.
const FRAME_WAIT: Duration = Duration::from_millis(20);

/// Start the bridge thread.
///
/// Subsystem failures are forwarded to `failed` so the caller can shut
/// down.
pub fn spawn(
    anapad: Arc<Mutex<Anapad>>,
    touches: Subscription<TouchFrame>,
    failures: [Subscription<PollFailure>; 2],
    failed: UnboundedSender<PollFailure>,
) -> AnapadResult<PollingThread<()>> {
    PollingThread::spawn(THREAD_NAME, move |stop| {
        run(&anapad, &touches, &failures, &failed, &stop);
    })
}

fn run(
    anapad: &Mutex<Anapad>,
    touches: &Subscription<TouchFrame>,
    failures: &[Subscription<PollFailure>; 2],
    failed: &UnboundedSender<PollFailure>,
    stop: &StopToken,
) {
    let mut feedback = anapad.lock().force_feedback();
    debug!(mode = %feedback.config().mode, "feedback bridge running");

    while !stop.is_stop_requested() {
        match touches.recv_timeout(FRAME_WAIT) {
            Ok(frame) => {
                if let Err(e) = anapad.lock().feed(&frame, &mut feedback) {
                    warn!(error = %e, "feedback actuation failed");
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("touch subscription closed");
                break;
            }
        }

        for failure in failures.iter().filter_map(|rx| rx.try_recv().ok()) {
            error!(subsystem = failure.subsystem, "subsystem failed");
            if failed.send(failure).is_err() {
                debug!("nobody is waiting for failures");
            }
        }
    }
}
