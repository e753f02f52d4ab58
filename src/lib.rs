//! Collection primitives layered over ordered sequences.
//!
//! - [`flatten`] / [`flatten_root`]: cycle-safe, pre-order flattening of
//!   graphs given a branch locator.
//! - [`RetryExecutor`] / [`try_until_success`]: attempt items in order until
//!   one succeeds, aggregating failures or aborting on a stop-kind error.
//! - [`ObservableVec`] and [`BatchMutator`]: an observable sequence with
//!   batched mutations that notify once, guarded against reentrant mutation
//!   during change dispatch.
//! - [`parse_delimited`] / [`windows`]: lazy, restartable sequence helpers.
//!
//! Batch notification policies can be configured through [`config::Settings`].

pub mod config;
pub mod domain;
pub mod util;

pub use domain::{
    flatten, flatten_root, parse_delimited, try_until_success, windows, AggregatedFailure,
    BatchMutator, BatchOptions, BoxError, ChangeNotification, CollectionError, CollectionResult,
    ObservableVec, RangeNotification, RemovalNotification, RetryError, RetryExecutor, Subscription,
    VisitedSet,
};
