// src/retry.rs
//! Retry with exponential backoff, and deadline racing.
//!
//! `max_retries` counts total attempts. Whether a failure is retried depends
//! on `retryable_errors`: empty means every failure is retried, otherwise
//! the error's code or message must contain one of the listed substrings.
//! Errors that are not retryable are returned unwrapped as
//! [`RetryError::Operation`].

use std::fmt;
use std::future::Future;
use std::time::Duration;

use futures::TryFutureExt;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::RetrySettings;

/// Code reported by [`RetryError::Timeout`].
pub const TIMEOUT_CODE: &str = "ETIMEDOUT";

/// Exposes a machine-readable code for retry classification.
pub trait ErrorCode: fmt::Display {
    fn code(&self) -> Option<&str> {
        None
    }
}

impl ErrorCode for std::io::Error {
    fn code(&self) -> Option<&str> {
        match self.kind() {
            std::io::ErrorKind::TimedOut => Some("ETIMEDOUT"),
            std::io::ErrorKind::ConnectionReset => Some("ECONNRESET"),
            std::io::ErrorKind::ConnectionRefused => Some("ECONNREFUSED"),
            _ => None,
        }
    }
}

impl ErrorCode for anyhow::Error {}

/// Per-call retry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOptions {
    /// Total attempts, including the first.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Substrings of retryable codes/messages. Empty retries everything.
    pub retryable_errors: Vec<String>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryOptions {
    fn from(s: &RetrySettings) -> Self {
        Self {
            max_retries: s.max_retries,
            initial_delay: Duration::from_millis(s.initial_delay_ms),
            max_delay: Duration::from_millis(s.max_delay_ms),
            backoff_multiplier: s.backoff_multiplier,
            retryable_errors: s.retryable_errors.clone(),
        }
    }
}

impl RetryOptions {
    /// Retries every failure.
    #[must_use]
    pub fn retry_all(mut self) -> Self {
        self.retryable_errors.clear();
        self
    }

    /// Delay after the given failed attempt (1-based), capped at `max_delay`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let initial_ms = self.initial_delay.as_millis() as f64;
        let max_ms = self.max_delay.as_millis() as f64;
        let ms = (initial_ms * self.backoff_multiplier.powi(exponent)).min(max_ms);
        Duration::from_millis(ms.round() as u64)
    }

    fn is_retryable(&self, code: Option<&str>, message: &str) -> bool {
        if self.retryable_errors.is_empty() {
            return true;
        }
        self.retryable_errors.iter().any(|needle| {
            code.is_some_and(|c| c.contains(needle.as_str())) || message.contains(needle.as_str())
        })
    }
}

/// Failure of a retried or deadline-bound operation.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The operation's own error.
    Operation(E),
    Timeout {
        timeout_ms: u64,
        context: Option<String>,
    },
    Exhausted {
        attempts: u32,
        context: Option<String>,
        last: Box<RetryError<E>>,
    },
}

fn label(context: Option<&str>) -> String {
    context.map(|c| format!(" ({c})")).unwrap_or_default()
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Operation(e) => e.fmt(f),
            RetryError::Timeout { timeout_ms, context } => {
                write!(f, "Timeout after {timeout_ms}ms{}", label(context.as_deref()))
            }
            RetryError::Exhausted {
                attempts,
                context,
                last,
            } => write!(
                f,
                "Failed after {attempts} attempts{}: {last}",
                label(context.as_deref())
            ),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetryError::Operation(e) => e.source(),
            RetryError::Timeout { .. } => None,
            RetryError::Exhausted { last, .. } => Some(last.as_ref()),
        }
    }
}

impl<E: ErrorCode> ErrorCode for RetryError<E> {
    fn code(&self) -> Option<&str> {
        match self {
            RetryError::Operation(e) => e.code(),
            RetryError::Timeout { .. } => Some(TIMEOUT_CODE),
            RetryError::Exhausted { .. } => None,
        }
    }
}

impl<E> RetryError<E> {
    /// True for a deadline failure, directly or as the last exhausted attempt.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            RetryError::Timeout { .. } => true,
            RetryError::Exhausted { last, .. } => last.is_timeout(),
            RetryError::Operation(_) => false,
        }
    }
}

/// Runs `f` until it succeeds, a non-retryable error occurs, or
/// `options.max_retries` attempts have failed.
///
/// # Errors
/// `Operation(e)` for a non-retryable error, `Exhausted` once attempts run out.
pub async fn execute_with_retry<T, E, F, Fut>(
    mut f: F,
    options: &RetryOptions,
    context: Option<&str>,
) -> Result<T, RetryError<E>>
where
    E: ErrorCode,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_loop(move || f().map_err(RetryError::Operation), options, context).await
}

/// Races `f` against a `timeout` deadline.
///
/// Losing the race drops the operation's future; work it already handed off
/// elsewhere (spawned tasks, child processes) is not stopped.
///
/// # Errors
/// `Timeout` if the deadline passes first, `Operation(e)` if `f` fails first.
pub async fn execute_with_timeout<T, E, Fut>(
    f: Fut,
    timeout: Duration,
    context: Option<&str>,
) -> Result<T, RetryError<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(result) => result.map_err(RetryError::Operation),
        Err(_) => Err(RetryError::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            context: context.map(str::to_string),
        }),
    }
}

/// Each attempt bounded by `timeout`, the attempts governed by `options`.
/// A timed-out attempt is an ordinary failure with code `ETIMEDOUT`.
///
/// # Errors
/// As [`execute_with_retry`]; a non-retryable timeout is returned as `Timeout`.
pub async fn execute_with_timeout_and_retry<T, E, F, Fut>(
    mut f: F,
    timeout: Duration,
    options: &RetryOptions,
    context: Option<&str>,
) -> Result<T, RetryError<E>>
where
    E: ErrorCode,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_loop(
        move || execute_with_timeout(f(), timeout, context),
        options,
        context,
    )
    .await
}

async fn retry_loop<T, E, F, Fut>(
    mut attempt_fn: F,
    options: &RetryOptions,
    context: Option<&str>,
) -> Result<T, RetryError<E>>
where
    E: ErrorCode,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
{
    let max_attempts = options.max_retries.max(1);
    let mut attempt = 1;

    loop {
        let err = match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !options.is_retryable(err.code(), &err.to_string()) {
            return Err(err);
        }

        if attempt >= max_attempts {
            debug!("{}: all {max_attempts} attempts failed: {err}", context.unwrap_or("operation"));
            return Err(RetryError::Exhausted {
                attempts: max_attempts,
                context: context.map(str::to_string),
                last: Box::new(err),
            });
        }

        let delay = options.delay_for_attempt(attempt);
        warn!(
            "{}: attempt {attempt}/{max_attempts} failed, retrying in {}ms: {err}",
            context.unwrap_or("operation"),
            delay.as_millis()
        );
        sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn fast() -> RetryOptions {
        RetryOptions {
            initial_delay: Duration::from_millis(50),
            backoff_multiplier: 1.0,
            ..RetryOptions::default()
        }
        .retry_all()
    }

    fn fail(msg: &str) -> io::Error {
        io::Error::other(msg.to_string())
    }

    #[test]
    fn delay_grows_and_caps() {
        let opts = RetryOptions::default();
        assert_eq!(opts.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(opts.delay_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(opts.delay_for_attempt(3), Duration::from_millis(4000));
        assert_eq!(opts.delay_for_attempt(6), Duration::from_millis(10_000));
    }

    #[test]
    fn classification_uses_code_or_message() {
        let opts = RetryOptions::default();
        assert!(opts.is_retryable(Some("ECONNRESET"), "socket hang up"));
        assert!(opts.is_retryable(None, "getaddrinfo ENOTFOUND api.example"));
        assert!(!opts.is_retryable(None, "permission denied"));
        assert!(RetryOptions::default().retry_all().is_retryable(None, "anything"));
    }

    #[tokio::test]
    async fn success_runs_once() {
        let calls = Cell::new(0);
        let out = execute_with_retry(
            || {
                calls.set(calls.get() + 1);
                async { Ok::<_, io::Error>("ok") }
            },
            &RetryOptions { max_retries: 5, ..fast() },
            None,
        )
        .await;
        assert_eq!(out.unwrap(), "ok");
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = Cell::new(0);
        let out = execute_with_retry(
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { if n < 3 { Err(fail("flaky")) } else { Ok(n) } }
            },
            &fast(),
            None,
        )
        .await;
        assert_eq!(out.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_reports_attempts_and_context() {
        let calls = Cell::new(0);
        let out: Result<(), RetryError<anyhow::Error>> = execute_with_retry(
            || {
                calls.set(calls.get() + 1);
                async { Err(anyhow::anyhow!("always down")) }
            },
            &RetryOptions { max_retries: 2, ..fast() },
            Some("news-sync"),
        )
        .await;
        let err = out.unwrap_err();
        assert_eq!(calls.get(), 2);
        let msg = err.to_string();
        assert!(msg.contains("Failed after 2 attempts"), "{msg}");
        assert!(msg.contains("news-sync"), "{msg}");
        assert!(msg.contains("always down"), "{msg}");
    }

    #[tokio::test(start_paused = true)]
    async fn warns_once_per_retry_only() {
        let warnings = Arc::new(AtomicUsize::new(0));
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings))),
        );

        let out: Result<(), RetryError<io::Error>> = execute_with_retry(
            || async { Err(fail("down")) },
            &RetryOptions { max_retries: 3, ..fast() },
            Some("feed"),
        )
        .await;

        assert!(matches!(out, Err(RetryError::Exhausted { attempts: 3, .. })));
        assert_eq!(warnings.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_is_returned_unwrapped() {
        let calls = Cell::new(0);
        let out: Result<(), _> = execute_with_retry(
            || {
                calls.set(calls.get() + 1);
                async { Err(fail("bad request")) }
            },
            &RetryOptions::default(),
            Some("ctx"),
        )
        .await;
        assert_eq!(calls.get(), 1);
        assert!(matches!(out, Err(RetryError::Operation(ref e)) if e.to_string() == "bad request"));
    }

    #[tokio::test(start_paused = true)]
    async fn listed_codes_are_retried() {
        let calls = Cell::new(0);
        let out = execute_with_retry(
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n == 1 {
                        Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"))
                    } else {
                        Ok(n)
                    }
                }
            },
            &RetryOptions::default(),
            None,
        )
        .await;
        assert_eq!(out.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_waits_between_attempts() {
        let calls = Cell::new(0);
        let start = Instant::now();
        let out = execute_with_retry(
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { if n == 1 { Err(fail("once")) } else { Ok(()) } }
            },
            &RetryOptions {
                max_retries: 2,
                initial_delay: Duration::from_millis(100),
                ..fast()
            },
            None,
        )
        .await;
        assert!(out.is_ok());
        assert_eq!(calls.get(), 2);
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_wins_the_race() {
        let start = Instant::now();
        let out: Result<&str, RetryError<io::Error>> = execute_with_timeout(
            async {
                sleep(Duration::from_millis(500)).await;
                Ok("late")
            },
            Duration::from_millis(100),
            Some("slow-op"),
        )
        .await;
        let err = out.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Timeout after 100ms (slow-op)");
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn fast_operation_beats_timeout() {
        let out: Result<u8, RetryError<io::Error>> =
            execute_with_timeout(async { Ok(7) }, Duration::from_secs(1), None).await;
        assert_eq!(out.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_and_retry_recovers_from_failure() {
        let calls = Cell::new(0);
        let out = execute_with_timeout_and_retry(
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { if n == 1 { Err(fail("boom")) } else { Ok("done") } }
            },
            Duration::from_secs(1),
            &RetryOptions { max_retries: 2, ..fast() },
            None,
        )
        .await;
        assert_eq!(out.unwrap(), "done");
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_attempts_are_retried_by_default() {
        let calls = Cell::new(0);
        let out = execute_with_timeout_and_retry(
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n == 1 {
                        sleep(Duration::from_millis(500)).await;
                    }
                    Ok::<_, io::Error>(n)
                }
            },
            Duration::from_millis(100),
            &RetryOptions {
                initial_delay: Duration::from_millis(10),
                ..RetryOptions::default()
            },
            None,
        )
        .await;
        assert_eq!(out.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_timeouts_name_the_context() {
        let out: Result<(), RetryError<io::Error>> = execute_with_timeout_and_retry(
            || async {
                sleep(Duration::from_millis(500)).await;
                Ok(())
            },
            Duration::from_millis(100),
            &RetryOptions {
                max_retries: 1,
                initial_delay: Duration::from_millis(10),
                ..RetryOptions::default()
            },
            Some("my-agent"),
        )
        .await;
        let err = out.unwrap_err();
        assert!(err.is_timeout());
        let msg = err.to_string();
        assert!(msg.contains("Timeout"), "{msg}");
        assert!(msg.contains("my-agent"), "{msg}");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_not_retried_when_excluded() {
        let calls = Cell::new(0);
        let out: Result<(), RetryError<io::Error>> = execute_with_timeout_and_retry(
            || {
                calls.set(calls.get() + 1);
                async {
                    sleep(Duration::from_millis(500)).await;
                    Ok(())
                }
            },
            Duration::from_millis(100),
            &RetryOptions {
                retryable_errors: vec!["ECONNRESET".into()],
                ..fast()
            },
            None,
        )
        .await;
        assert_eq!(calls.get(), 1);
        assert!(matches!(out, Err(RetryError::Timeout { timeout_ms: 100, .. })));
    }
}
