//! Console progress indicator shown while a request is in flight.

use std::io::Write;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Prints `[<elapsed>s] <label>...` to stderr once a second until stopped.
///
/// Purely cosmetic: it shares no state with the conversation.
pub struct ProgressIndicator {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ProgressIndicator {
    pub fn start(label: &'static str) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let started = Instant::now();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            let mut dots = 0usize;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let elapsed = started.elapsed().as_secs_f64();
                        let line = format!("\r[{elapsed:.1}s] {label}{:<3}", ".".repeat(dots % 4));
                        let mut err = std::io::stderr();
                        let _ = err.write_all(line.as_bytes());
                        let _ = err.flush();
                        dots += 1;
                    }
                }
            }
            let _ = std::io::stderr().write_all(b"\n");
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Signal the task to stop and wait for it to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::debug!(error = %e, "progress indicator task ended abnormally");
            }
        }
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
