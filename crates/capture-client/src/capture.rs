//! Periodic capture loop.
//!
//! While capturing, the loop grabs a frame immediately and then once per
//! interval, and submits each one to the relay on its own task. Submissions
//! are not serialized: a slow relay means several requests in flight, and
//! whichever answers last wins the display.
//!
//! An unauthorized response ends the loop with
//! [`CaptureExit::SessionExpired`]; any other failure is rendered inline and
//! the loop carries on.

use common::api::DEFAULT_CAPTURE_INTERVAL_MS;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{
    task::{JoinHandle, JoinSet},
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    api::RelayApi,
    camera::{Camera, FrameStream},
    encode::FrameEncoder,
    error::ClientError,
    render::{self, Renderer},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing,
}

/// Why a capture run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureExit {
    /// Stopped locally
    Stopped,
    /// The relay rejected the session; log in again before restarting
    SessionExpired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleOutcome {
    Rendered,
    Failed,
    Discarded,
    SessionExpired,
}

struct ActiveCapture {
    cancel: CancellationToken,
    driver: JoinHandle<CaptureExit>,
}

pub struct CaptureLoop {
    camera: Arc<dyn Camera>,
    api: Arc<dyn RelayApi>,
    renderer: Arc<dyn Renderer>,
    encoder: FrameEncoder,
    interval: Duration,
    session: Arc<str>,
    active: Option<ActiveCapture>,
}

impl CaptureLoop {
    pub fn new(
        camera: Arc<dyn Camera>,
        api: Arc<dyn RelayApi>,
        renderer: Arc<dyn Renderer>,
        encoder: FrameEncoder,
        interval: Duration,
        session: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            camera,
            api,
            renderer,
            encoder,
            // tokio intervals can't have a zero period
            interval: if interval.is_zero() {
                Duration::from_millis(DEFAULT_CAPTURE_INTERVAL_MS)
            } else {
                interval
            },
            session: session.into(),
            active: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> CaptureState {
        match &self.active {
            Some(active) if !active.driver.is_finished() => CaptureState::Capturing,
            _ => CaptureState::Idle,
        }
    }

    /// Acquire the camera and begin capturing.
    ///
    /// If the camera can't be opened the error is rendered and the loop
    /// stays idle. Calling this while already capturing does nothing.
    pub fn start(&mut self) -> Result<(), ClientError> {
        if self.state() == CaptureState::Capturing {
            debug!("capture already running");
            return Ok(());
        }
        // a run that ended on its own (session expiry) is replaced
        self.active = None;

        let stream = match self.camera.open() {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "failed to acquire camera");
                self.renderer.render_error(render::CAMERA_UNAVAILABLE);
                return Err(e);
            }
        };

        let cancel = CancellationToken::new();
        let cycle = Cycle {
            api: self.api.clone(),
            renderer: self.renderer.clone(),
            session: self.session.clone(),
            cancel: cancel.clone(),
        };
        let driver = tokio::spawn(drive(stream, cycle, self.encoder, self.interval));

        info!(
            interval_ms = self.interval.as_millis() as u64,
            "capture started"
        );
        self.active = Some(ActiveCapture { cancel, driver });
        Ok(())
    }

    /// Resolves once the current run ends on its own or is asked to stop.
    ///
    /// The future does not borrow the loop, so it can race a shutdown signal
    /// before calling [`CaptureLoop::stop`].
    pub fn finished(&self) -> impl Future<Output = ()> + Send + 'static {
        let cancel = self.active.as_ref().map(|active| active.cancel.clone());
        async move {
            if let Some(cancel) = cancel {
                cancel.cancelled().await;
            }
        }
    }

    /// Run until the relay ends the session or someone else stops the loop.
    pub async fn wait(&mut self) -> CaptureExit {
        self.finished().await;
        self.stop().await
    }

    /// Stop capturing: cancel the timer, drop in-flight submissions, release
    /// the camera and show the placeholder. Safe to call repeatedly.
    ///
    /// Returns how the run ended; a run the relay already ended reports
    /// [`CaptureExit::SessionExpired`].
    pub async fn stop(&mut self) -> CaptureExit {
        let exit = match self.active.take() {
            Some(active) => {
                active.cancel.cancel();
                match active.driver.await {
                    Ok(exit) => exit,
                    Err(e) => {
                        warn!(error = %e, "capture task ended abnormally");
                        CaptureExit::Stopped
                    }
                }
            }
            None => CaptureExit::Stopped,
        };
        self.renderer.render_placeholder();
        info!(?exit, "capture stopped");
        exit
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            active.cancel.cancel();
        }
    }
}

#[derive(Clone)]
struct Cycle {
    api: Arc<dyn RelayApi>,
    renderer: Arc<dyn Renderer>,
    session: Arc<str>,
    cancel: CancellationToken,
}

impl Cycle {
    async fn submit(self, image: String) -> CycleOutcome {
        let result = self.api.analyze(&self.session, &image).await;

        // a response arriving after stop must not repaint the display
        if self.cancel.is_cancelled() {
            return CycleOutcome::Discarded;
        }

        match result {
            Ok(analysis) => {
                debug!(face_detected = analysis.face_detected, "frame analyzed");
                self.renderer.render_result(&analysis);
                CycleOutcome::Rendered
            }
            Err(ClientError::Unauthorized) => CycleOutcome::SessionExpired,
            Err(e) => {
                warn!(error = %e, "frame analysis failed");
                self.renderer.render_error(&e.to_string());
                CycleOutcome::Failed
            }
        }
    }
}

async fn drive(
    mut stream: Box<dyn FrameStream>,
    cycle: Cycle,
    encoder: FrameEncoder,
    interval: Duration,
) -> CaptureExit {
    // first tick fires immediately
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight = JoinSet::new();

    let exit = loop {
        tokio::select! {
            biased;
            _ = cycle.cancel.cancelled() => break CaptureExit::Stopped,
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Ok(CycleOutcome::SessionExpired) = joined {
                    warn!("session rejected by relay");
                    break CaptureExit::SessionExpired;
                }
            }
            _ = ticker.tick() => {
                match stream.grab().and_then(|frame| encoder.encode(&frame)) {
                    Ok(image) => {
                        in_flight.spawn(cycle.clone().submit(image));
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to capture frame");
                        cycle.renderer.render_error(&e.to_string());
                    }
                }
            }
        }
    };

    cycle.cancel.cancel();
    in_flight.abort_all();
    stream.stop();
    if exit == CaptureExit::SessionExpired {
        cycle.renderer.render_error(render::SESSION_EXPIRED);
    }
    exit
}
