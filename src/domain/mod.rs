//! Domain layer: collection primitives
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod batch;
pub mod error;
pub mod graph;
pub mod monitor;
pub mod observable;
pub mod retry;
pub mod sequence;

pub use batch::{BatchMutator, BatchOptions, RangeNotification, RemovalNotification};
pub use error::{CollectionError, CollectionResult};
pub use graph::{flatten, flatten_root, GraphWalker, VisitedSet};
pub use monitor::{DispatchGuard, ReentrancyMonitor};
pub use observable::{ChangeNotification, ObservableVec, Subscription};
pub use retry::{try_until_success, AggregatedFailure, BoxError, RetryError, RetryExecutor};
pub use sequence::{parse_delimited, windows, Delimited, Windows};
