//! Retry-until-success over a sequence of items.
//!
//! Each item gets one attempt. The first attempt that succeeds ends the run.
//! A failure matching the stop policy aborts the run immediately; any other
//! failure is recorded and handed to the next attempt as the previous error.

use std::error::Error;
use std::fmt;

use itertools::Itertools;
use tracing::{debug, instrument};

/// Boxed error type for attempts that fail with heterogeneous errors.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Every failure of an exhausted run, in attempt order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedFailure<E> {
    failures: Vec<E>,
}

impl<E> AggregatedFailure<E> {
    pub fn failures(&self) -> &[E] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<E> {
        self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<E: fmt::Display> fmt::Display for AggregatedFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "no item to attempt");
        }
        write!(
            f,
            "all {} attempts failed: {}",
            self.failures.len(),
            self.failures.iter().join("; ")
        )
    }
}

impl<E: fmt::Debug + fmt::Display> Error for AggregatedFailure<E> {}

/// Why a retry run ended without success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// An attempt failed with a stop-kind error; earlier failures were discarded.
    Stopped(E),
    /// No attempt succeeded.
    Exhausted(AggregatedFailure<E>),
}

impl<E> RetryError<E> {
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped(_))
    }

    /// All failures carried by this error, in attempt order.
    pub fn into_failures(self) -> Vec<E> {
        match self {
            Self::Stopped(error) => vec![error],
            Self::Exhausted(aggregate) => aggregate.into_failures(),
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped(error) => write!(f, "stopped by error: {}", error),
            Self::Exhausted(aggregate) => write!(f, "{}", aggregate),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> Error for RetryError<E> {}

/// Runs an attempt per item until one succeeds.
///
/// Without a stop policy every failure is aggregated.
pub struct RetryExecutor<'a, E> {
    stop: Option<Box<dyn Fn(&E) -> bool + 'a>>,
}

impl<E> Default for RetryExecutor<'_, E> {
    fn default() -> Self {
        Self { stop: None }
    }
}

impl<E> fmt::Debug for RetryExecutor<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("stop_policy", &self.stop.is_some())
            .finish()
    }
}

impl<'a, E> RetryExecutor<'a, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treats every error for which `is_stop` returns true as a stop-kind error.
    pub fn stop_when(mut self, is_stop: impl Fn(&E) -> bool + 'a) -> Self {
        self.stop = Some(Box::new(is_stop));
        self
    }

    fn is_stop(&self, error: &E) -> bool {
        self.stop.as_ref().is_some_and(|is_stop| is_stop(error))
    }

    /// Attempts `items` in order.
    ///
    /// `attempt` receives the item and the error of the previous failed
    /// attempt, if any.
    #[instrument(level = "debug", skip_all)]
    pub fn run<T, I, F>(&self, items: I, mut attempt: F) -> Result<(), RetryError<E>>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(T, Option<&E>) -> Result<(), E>,
    {
        let mut failures: Vec<E> = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            match attempt(item, failures.last()) {
                Ok(()) => {
                    debug!(attempt = index, failed = failures.len(), "attempt succeeded");
                    return Ok(());
                }
                Err(error) if self.is_stop(&error) => {
                    debug!(attempt = index, discarded = failures.len(), "stopped by stop-kind error");
                    return Err(RetryError::Stopped(error));
                }
                Err(error) => {
                    debug!(attempt = index, "attempt failed, trying next item");
                    failures.push(error);
                }
            }
        }

        debug!(failed = failures.len(), "all attempts failed");
        Err(RetryError::Exhausted(AggregatedFailure { failures }))
    }
}

impl<'a> RetryExecutor<'a, BoxError> {
    /// Stops on boxed errors whose concrete type is `K`.
    ///
    /// `K` must be an error type:
    ///
    /// ```compile_fail
    /// use collection_helpers::domain::retry::{BoxError, RetryExecutor};
    ///
    /// let executor = RetryExecutor::<BoxError>::new().stop_on::<i32>();
    /// ```
    pub fn stop_on<K: Error + 'static>(self) -> Self {
        self.stop_when(|error: &BoxError| (**error).is::<K>())
    }
}

/// Attempts `items` in order until one succeeds, aggregating every failure.
pub fn try_until_success<T, E, I, F>(items: I, attempt: F) -> Result<(), RetryError<E>>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T, Option<&E>) -> Result<(), E>,
{
    RetryExecutor::new().run(items, attempt)
}
