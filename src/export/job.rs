use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ExportError;
use crate::export::{ExportArtifact, ExportRequest, export};
use crate::render::RenderFrame;

/// Export running on a worker thread against a frame snapshot.
///
/// The snapshot is shared, never copied back: the owning surface may repaint
/// while the job runs. Dropping the handle detaches the worker; its result is
/// discarded.
#[derive(Debug)]
pub struct ExportJob {
    receiver: Receiver<Result<ExportArtifact, ExportError>>,
    cancelled: Arc<AtomicBool>,
    finished: Option<Result<ExportArtifact, ExportError>>,
}

impl ExportJob {
    #[must_use]
    pub fn spawn(snapshot: Arc<RenderFrame>, request: ExportRequest) -> Self {
        let (sender, receiver) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        thread::spawn(move || {
            let outcome = if flag.load(Ordering::Acquire) {
                Err(ExportError::Cancelled)
            } else {
                export(&snapshot, &request)
            };
            let outcome = if flag.load(Ordering::Acquire) {
                Err(ExportError::Cancelled)
            } else {
                outcome
            };
            // The handle may already be gone.
            if sender.send(outcome).is_err() {
                debug!(filename = %request.filename, "export result dropped, job detached");
            }
        });
        Self {
            receiver,
            cancelled,
            finished: None,
        }
    }

    /// Requests cancellation; a result produced afterwards is discarded.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Non-blocking check for a finished result.
    pub fn is_finished(&mut self) -> bool {
        if self.finished.is_none() {
            if let Ok(result) = self.receiver.try_recv() {
                self.finished = Some(result);
            }
        }
        self.finished.is_some()
    }

    /// Waits up to `timeout` for the artifact.
    ///
    /// On timeout the job is cancelled and `ExportError::TimedOut` returned.
    pub fn wait_timeout(mut self, timeout: Duration) -> Result<ExportArtifact, ExportError> {
        if self.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        let result = match self.finished.take() {
            Some(result) => result,
            None => match self.receiver.recv_timeout(timeout) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => {
                    self.cancel();
                    warn!(?timeout, "export timed out");
                    return Err(ExportError::TimedOut(timeout));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ExportError::Capture("export worker stopped unexpectedly".to_owned()));
                }
            },
        };
        if self.is_cancelled() {
            return Err(ExportError::Cancelled);
        }
        result
    }

    /// Blocks until the worker finishes.
    pub fn wait(self) -> Result<ExportArtifact, ExportError> {
        self.wait_timeout(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    use super::ExportJob;
    use crate::core::Viewport;
    use crate::error::ExportError;
    use crate::export::{ExportFormat, ExportRequest};
    use crate::render::{CanvasLayerKind, Color, RectPrimitive, RenderFrame};

    fn snapshot() -> Arc<RenderFrame> {
        let mut frame = RenderFrame::new(Viewport::new(40, 40));
        frame.push_rect(
            CanvasLayerKind::Series,
            RectPrimitive::new(1.0, 1.0, 5.0, 5.0, Color::rgb(0.0, 0.0, 1.0)),
        );
        Arc::new(frame)
    }

    #[test]
    fn job_delivers_artifact() {
        let job = ExportJob::spawn(snapshot(), ExportRequest::new(ExportFormat::Svg, "a.svg"));
        let artifact = job.wait_timeout(Duration::from_secs(10)).expect("artifact");
        assert_eq!(artifact.filename, "a.svg");
        assert!(!artifact.is_empty());
    }

    #[test]
    fn slow_job_times_out_and_is_cancelled() {
        let (sender, receiver) = mpsc::channel();
        let job = ExportJob {
            receiver,
            cancelled: Arc::new(AtomicBool::new(false)),
            finished: None,
        };
        let flag = Arc::clone(&job.cancelled);
        assert!(matches!(
            job.wait_timeout(Duration::from_millis(10)),
            Err(ExportError::TimedOut(_))
        ));
        assert!(flag.load(Ordering::Acquire));
        drop(sender);
    }

    #[test]
    fn cancelled_job_reports_cancelled() {
        let job = ExportJob::spawn(snapshot(), ExportRequest::new(ExportFormat::Svg, "a.svg"));
        job.cancel();
        assert!(matches!(
            job.wait_timeout(Duration::from_secs(10)),
            Err(ExportError::Cancelled)
        ));
    }
}
