//! Batched mutation of an [`ObservableVec`].
//!
//! Mutating through the per-item API fires one notification per item. The
//! operations here write the backing storage directly and emit at most one
//! notification for the whole batch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::error::{CollectionError, CollectionResult};
use crate::domain::observable::{ChangeNotification, ObservableVec};

/// Notification emitted by [`BatchMutator::add_range`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeNotification {
    /// A single [`ChangeNotification::Reset`].
    #[default]
    Reset,
    /// A single [`ChangeNotification::Added`] carrying all appended items.
    Range,
}

/// Notification strategy of [`BatchMutator::remove_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalNotification {
    /// One [`ChangeNotification::Reset`] for all removals.
    #[default]
    Batched,
    /// One [`ChangeNotification::Removed`] per removed item, last index first.
    PerItem,
}

impl fmt::Display for RangeNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reset => write!(f, "reset"),
            Self::Range => write!(f, "range"),
        }
    }
}

impl FromStr for RangeNotification {
    type Err = CollectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reset" => Ok(Self::Reset),
            "range" => Ok(Self::Range),
            other => Err(CollectionError::Parse {
                value: other.to_string(),
                message: "expected `reset` or `range`".to_string(),
            }),
        }
    }
}

impl fmt::Display for RemovalNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Batched => write!(f, "batched"),
            Self::PerItem => write!(f, "per_item"),
        }
    }
}

impl FromStr for RemovalNotification {
    type Err = CollectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batched" => Ok(Self::Batched),
            "per_item" | "per-item" => Ok(Self::PerItem),
            other => Err(CollectionError::Parse {
                value: other.to_string(),
                message: "expected `batched` or `per_item`".to_string(),
            }),
        }
    }
}

/// Notification policies for batch operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    pub add_range: RangeNotification,
    pub remove_all: RemovalNotification,
}

/// Many structural changes, perceived by subscribers as one.
///
/// Every operation that would change the target fails with
/// [`CollectionError::ReentrancyViolation`] when called from inside the
/// target's own change dispatch. Empty batches return before that check.
pub trait BatchMutator<T> {
    /// Appends `items`. Emits nothing when `items` is empty.
    fn add_range<I: IntoIterator<Item = T>>(&self, items: I) -> CollectionResult<()>;

    /// Replaces the whole contents by `items` and emits one reset.
    /// Emits nothing when both the target and `items` are empty.
    fn replace_all_by<I: IntoIterator<Item = T>>(&self, items: I) -> CollectionResult<()>;

    /// Removes every item matching `predicate`, returning how many were removed.
    ///
    /// `predicate` may read the target; it never runs while the storage is
    /// borrowed mutably.
    fn remove_all<P: FnMut(&T) -> bool>(&self, predicate: P) -> CollectionResult<usize>;
}

impl<T: Clone + 'static> BatchMutator<T> for ObservableVec<T> {
    #[instrument(level = "debug", skip_all)]
    fn add_range<I: IntoIterator<Item = T>>(&self, items: I) -> CollectionResult<()> {
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() {
            return Ok(());
        }
        self.monitor().check()?;

        let mode = self.options().add_range;
        debug!(count = items.len(), %mode, "adding range");
        self.apply_batch(|storage| {
            let index = storage.len();
            match mode {
                RangeNotification::Reset => {
                    storage.extend(items);
                    Some(ChangeNotification::Reset)
                }
                RangeNotification::Range => {
                    storage.extend(items.iter().cloned());
                    Some(ChangeNotification::Added { index, items })
                }
            }
        })
    }

    #[instrument(level = "debug", skip_all)]
    fn replace_all_by<I: IntoIterator<Item = T>>(&self, items: I) -> CollectionResult<()> {
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() && self.is_empty() {
            return Ok(());
        }
        self.monitor().check()?;

        self.apply_batch(|storage| {
            debug!(removed = storage.len(), added = items.len(), "replacing contents");
            storage.clear();
            storage.extend(items);
            Some(ChangeNotification::Reset)
        })
    }

    #[instrument(level = "debug", skip_all)]
    fn remove_all<P: FnMut(&T) -> bool>(&self, mut predicate: P) -> CollectionResult<usize> {
        self.monitor().check()?;

        match self.options().remove_all {
            RemovalNotification::Batched => {
                let keep: Vec<bool> =
                    self.with(|items| items.iter().map(|item| !predicate(item)).collect());
                let removed = keep.iter().filter(|kept| !**kept).count();
                if removed == 0 {
                    return Ok(0);
                }

                self.apply_batch(|storage| {
                    let mut keep = keep.into_iter();
                    storage.retain(|_| keep.next().unwrap_or(true));
                    Some(ChangeNotification::Reset)
                })?;
                debug!(removed, "removed matching items in one batch");
                Ok(removed)
            }
            RemovalNotification::PerItem => {
                let mut removed = 0;
                for index in (0..self.len()).rev() {
                    let matches = self.with(|items| items.get(index).is_some_and(&mut predicate));
                    if matches {
                        self.remove_at(index)?;
                        removed += 1;
                    }
                }
                debug!(removed, "removed matching items one by one");
                Ok(removed)
            }
        }
    }
}
