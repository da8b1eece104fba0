//! Checkable services and the closure-backed implementation

use super::Status;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A named dependency whose health can be queried on demand.
///
/// Every call to `status` performs a fresh check; implementations keep no
/// cached outcome between calls.
pub trait Service: Send + Sync {
    fn name(&self) -> &str;

    fn status(&self) -> Status;
}

type CheckFn = dyn Fn() -> anyhow::Result<()> + Send + Sync;

/// Wraps an arbitrary check closure.
///
/// The closure succeeding means healthy. Returning an error or panicking
/// means unhealthy, and the failure is rendered into the status error text
/// instead of escaping `status()`.
pub struct CallableService {
    name: String,
    check_fn: Arc<CheckFn>,
    essential: bool,
    timeout: Option<Duration>,
}

impl CallableService {
    /// Services are essential unless told otherwise.
    pub fn new<F>(name: impl Into<String>, check_fn: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check_fn: Arc::new(check_fn),
            essential: true,
            timeout: None,
        }
    }

    pub fn essential(mut self, essential: bool) -> Self {
        self.essential = essential;
        self
    }

    pub fn non_essential(self) -> Self {
        self.essential(false)
    }

    /// Stop waiting for the check after `timeout` and report it unhealthy.
    ///
    /// The check runs on its own thread. A timed-out check keeps running in
    /// the background until it returns on its own.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn is_essential(&self) -> bool {
        self.essential
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn run_with_timeout(&self, timeout: Duration) -> Result<(), String> {
        let (tx, rx) = mpsc::channel();
        let check_fn = Arc::clone(&self.check_fn);

        let spawned = thread::Builder::new()
            .name(format!("health-check-{}", self.name))
            .spawn(move || {
                let _ = tx.send(run_check(check_fn.as_ref()));
            });

        if let Err(e) = spawned {
            return Err(format!("failed to spawn check thread: {}", e));
        }

        match rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                Err(format!("check timed out after {}ms", timeout.as_millis()))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err("check thread exited without reporting".to_string())
            }
        }
    }
}

impl Service for CallableService {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> Status {
        let start = Instant::now();

        let outcome = match self.timeout {
            Some(timeout) => self.run_with_timeout(timeout),
            None => run_check(self.check_fn.as_ref()),
        };

        let latency = elapsed_ms(start);

        match outcome {
            Ok(()) => {
                debug!(service = %self.name, latency_ms = latency, "health check passed");
                Status::healthy(self.name.clone(), self.essential, latency)
            }
            Err(error) => {
                warn!(
                    service = %self.name,
                    essential = self.essential,
                    latency_ms = latency,
                    error = %error,
                    "health check failed"
                );
                Status::unhealthy(self.name.clone(), self.essential, Some(latency), error)
            }
        }
    }
}

impl fmt::Debug for CallableService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableService")
            .field("name", &self.name)
            .field("essential", &self.essential)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn run_check(check_fn: &CheckFn) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(check_fn)) {
        Ok(Ok(())) => Ok(()),
        // Debug output carries the "Caused by" chain and any captured backtrace.
        Ok(Err(e)) => Err(format!("{:?}", e)),
        Err(payload) => Err(format!("check panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Milliseconds elapsed since `start`.
pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, bail, Context};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_successful_check() {
        let service = CallableService::new("ok", || Ok(()));
        let status = service.status();

        assert_eq!(status.name(), "ok");
        assert!(status.is_healthy());
        assert!(status.is_essential());
        assert_eq!(status.error(), None);
        assert!(status.latency().unwrap() >= 0.0);
    }

    #[test]
    fn test_failing_check_captures_error() {
        let service = CallableService::new("db", || bail!("connection refused")).non_essential();
        let status = service.status();

        assert!(!status.is_healthy());
        assert!(!status.is_essential());
        assert!(status.error().unwrap().starts_with("connection refused"));
        assert!(status.latency().unwrap() >= 0.0);
    }

    #[test]
    fn test_error_text_includes_context() {
        let service = CallableService::new("db", || {
            Err(anyhow!("socket closed")).context("ping postgres")
        });
        let status = service.status();

        let error = status.error().unwrap();
        assert!(error.starts_with("ping postgres"));
        assert!(error.contains("Caused by:"));
        assert!(error.contains("socket closed"));
    }

    #[test]
    fn test_panicking_check_is_captured() {
        let service = CallableService::new("flaky", || panic!("boom"));
        let status = service.status();

        assert!(!status.is_healthy());
        assert_eq!(status.error(), Some("check panicked: boom"));
    }

    #[test]
    fn test_check_runs_on_every_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let service = CallableService::new("counter", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        service.status();
        service.status();
        service.status();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_latency_reflects_check_duration() {
        let service = CallableService::new("slow", || {
            thread::sleep(Duration::from_millis(20));
            Ok(())
        });
        let status = service.status();

        assert!(status.latency().unwrap() >= 20.0);
    }

    #[test]
    fn test_timeout_marks_check_unhealthy() {
        let service = CallableService::new("hung", || {
            thread::sleep(Duration::from_millis(500));
            Ok(())
        })
        .with_timeout(Duration::from_millis(20));
        let status = service.status();

        assert!(!status.is_healthy());
        assert_eq!(status.error(), Some("check timed out after 20ms"));
        assert!(status.latency().unwrap() >= 20.0);
    }

    #[test]
    fn test_timeout_passes_fast_checks_through() {
        let service = CallableService::new("fast", || Ok(()))
            .with_timeout(Duration::from_secs(5));
        assert!(service.status().is_healthy());

        let service = CallableService::new("fast-failure", || bail!("nope"))
            .with_timeout(Duration::from_secs(5));
        assert!(service.status().error().unwrap().starts_with("nope"));
    }

    #[test]
    fn test_builder_flags() {
        let service = CallableService::new("cache", || Ok(()))
            .essential(false)
            .with_timeout(Duration::from_millis(100));

        assert!(!service.is_essential());
        assert_eq!(service.timeout(), Some(Duration::from_millis(100)));
        assert!(format!("{:?}", service).contains("cache"));
    }
}
