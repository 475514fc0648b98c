use super::LiblibClient;
use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::{LiblibError, Result};
use crate::models::{GenerateStatus, GeneratedImage};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Wait policy for [`LiblibClient::poll_until_terminal_with`].
///
/// The default polls every five seconds with no bound. Set `max_attempts` or
/// `max_wait` to give up early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub max_wait: Option<Duration>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
            max_wait: None,
        }
    }
}

impl PollOptions {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }
}

impl LiblibClient {
    /// Poll with the client's configured policy until the job completes or fails.
    pub async fn poll_until_terminal(&self, job_id: &str) -> Result<Vec<GeneratedImage>> {
        let options = self.poll_options().clone();
        self.poll_until_terminal_with(job_id, &options, None).await
    }

    pub async fn poll_until_terminal_with(
        &self,
        job_id: &str,
        options: &PollOptions,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<GeneratedImage>> {
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            if cancel.map_or(false, |token| token.is_cancelled()) {
                log::warn!("Polling for job {} cancelled", job_id);
                return Err(LiblibError::Cancelled);
            }

            let job = self.query_status(job_id).await?;
            attempts += 1;

            match job.generate_status {
                GenerateStatus::Completed => {
                    log::info!(
                        "Job {} completed with {} image(s) after {} poll(s)",
                        job_id,
                        job.images.len(),
                        attempts
                    );
                    return Ok(job.images);
                }
                GenerateStatus::Failed => {
                    let message = job
                        .generate_msg
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| "Unknown error".to_string());
                    log::error!("Job {} failed: {}", job_id, message);
                    return Err(LiblibError::GenerationFailed(message));
                }
                status => {
                    log::debug!(
                        "Job {} is {:?} ({:.0}%), waiting {:?}",
                        job_id,
                        status,
                        job.percent_completed,
                        options.interval
                    );
                }
            }

            if options.max_attempts.map_or(false, |max| attempts >= max) {
                return Err(LiblibError::PollTimeout {
                    attempts,
                    elapsed: started.elapsed(),
                });
            }

            let mut delay = options.interval;
            if let Some(max_wait) = options.max_wait {
                let elapsed = started.elapsed();
                if elapsed >= max_wait {
                    return Err(LiblibError::PollTimeout { attempts, elapsed });
                }
                delay = delay.min(max_wait - elapsed);
            }

            match cancel {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => {
                            log::warn!("Polling for job {} cancelled", job_id);
                            return Err(LiblibError::Cancelled);
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }
    }
}
