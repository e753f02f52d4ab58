//! Ordered sequence that notifies subscribers of structural changes.
//!
//! # Architecture
//!
//! `ObservableVec<T>` is a cheap-to-clone handle around `Rc` shared state, for
//! single-threaded use. Subscribers are stored as `Weak` callbacks; the
//! [`Subscription`] returned by [`ObservableVec::subscribe`] owns the strong
//! reference, so dropping it unsubscribes. Dead entries are pruned on the
//! next dispatch.
//!
//! # Invariants
//!
//! 1. Every structural mutation emits exactly one notification, except the
//!    batch operations, which emit at most one for the whole batch.
//! 2. Subscribers are notified in registration order.
//! 3. The reentrancy monitor is busy for the whole dispatch and released
//!    afterwards, also when a subscriber panics.
//! 4. No mutation runs while the monitor is busy; it fails with
//!    [`CollectionError::ReentrancyViolation`] instead.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::domain::batch::BatchOptions;
use crate::domain::error::{CollectionError, CollectionResult};
use crate::domain::monitor::ReentrancyMonitor;

/// A structural change of an [`ObservableVec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeNotification<T> {
    /// `items` were inserted starting at `index`.
    Added { index: usize, items: Vec<T> },
    /// `items` were removed, the first of them from `index`.
    Removed { index: usize, items: Vec<T> },
    /// The item at `index` was replaced.
    Replaced { index: usize, old: T, new: T },
    /// The sequence changed wholesale; re-read it.
    Reset,
}

type Callback<T> = dyn Fn(&ChangeNotification<T>);

/// Keeps a subscriber registered. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription<T> {
    _callback: Rc<Callback<T>>,
}

impl<T> Subscription<T> {
    pub fn unsubscribe(self) {}
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish()
    }
}

struct Shared<T> {
    items: RefCell<Vec<T>>,
    subscribers: RefCell<Vec<Weak<Callback<T>>>>,
    monitor: ReentrancyMonitor,
    options: BatchOptions,
}

/// Observable ordered sequence.
pub struct ObservableVec<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for ObservableVec<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableVec")
            .field("items", &self.shared.items.borrow())
            .field("dispatching", &self.shared.monitor.is_busy())
            .finish()
    }
}

impl<T: Clone + 'static> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> From<Vec<T>> for ObservableVec<T> {
    fn from(items: Vec<T>) -> Self {
        Self::build(items, BatchOptions::default())
    }
}

impl<T: Clone + 'static> FromIterator<T> for ObservableVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T: Clone + 'static> ObservableVec<T> {
    pub fn new() -> Self {
        Self::with_options(BatchOptions::default())
    }

    /// Creates an empty sequence whose batch operations follow `options`.
    pub fn with_options(options: BatchOptions) -> Self {
        Self::build(Vec::new(), options)
    }

    fn build(items: Vec<T>, options: BatchOptions) -> Self {
        Self {
            shared: Rc::new(Shared {
                items: RefCell::new(items),
                subscribers: RefCell::new(Vec::new()),
                monitor: ReentrancyMonitor::new(),
                options,
            }),
        }
    }

    pub fn options(&self) -> BatchOptions {
        self.shared.options
    }

    pub fn len(&self) -> usize {
        self.shared.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.items.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.shared.items.borrow().get(index).cloned()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.shared.items.borrow().clone()
    }

    /// Runs `f` against the current contents without cloning them.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.shared.items.borrow())
    }

    /// Registers `callback` for every subsequent change.
    pub fn subscribe(&self, callback: impl Fn(&ChangeNotification<T>) + 'static) -> Subscription<T> {
        let callback: Rc<Callback<T>> = Rc::new(callback);
        self.shared
            .subscribers
            .borrow_mut()
            .push(Rc::downgrade(&callback));
        Subscription {
            _callback: callback,
        }
    }

    /// Number of subscribers whose [`Subscription`] is still alive.
    pub fn subscriber_count(&self) -> usize {
        self.shared
            .subscribers
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn monitor(&self) -> &ReentrancyMonitor {
        &self.shared.monitor
    }

    /// True only while this sequence is dispatching one of its own notifications.
    pub fn is_reentrant(&self) -> bool {
        self.shared.monitor.is_busy()
    }

    pub fn push(&self, item: T) -> CollectionResult<()> {
        self.apply_batch(|items| {
            let index = items.len();
            items.push(item.clone());
            Some(ChangeNotification::Added {
                index,
                items: vec![item],
            })
        })
    }

    /// Inserts `item` at `index`; `index == len()` appends.
    pub fn insert(&self, index: usize, item: T) -> CollectionResult<()> {
        self.shared.monitor.check()?;
        let len = self.len();
        if index > len {
            return Err(CollectionError::index_out_of_range(index, len));
        }
        self.apply_batch(|items| {
            items.insert(index, item.clone());
            Some(ChangeNotification::Added {
                index,
                items: vec![item],
            })
        })
    }

    pub fn remove_at(&self, index: usize) -> CollectionResult<T> {
        self.shared.monitor.check()?;
        let len = self.len();
        if index >= len {
            return Err(CollectionError::index_out_of_range(index, len));
        }
        let mut removed = None;
        self.apply_batch(|items| {
            let item = items.remove(index);
            removed = Some(item.clone());
            Some(ChangeNotification::Removed {
                index,
                items: vec![item],
            })
        })?;
        removed.ok_or_else(|| CollectionError::index_out_of_range(index, len))
    }

    /// Replaces the item at `index`, returning the previous one.
    pub fn replace_at(&self, index: usize, item: T) -> CollectionResult<T> {
        self.shared.monitor.check()?;
        let len = self.len();
        if index >= len {
            return Err(CollectionError::index_out_of_range(index, len));
        }
        let mut replaced = None;
        self.apply_batch(|items| {
            let old = std::mem::replace(&mut items[index], item.clone());
            replaced = Some(old.clone());
            Some(ChangeNotification::Replaced {
                index,
                old,
                new: item,
            })
        })?;
        replaced.ok_or_else(|| CollectionError::index_out_of_range(index, len))
    }

    /// Removes every item and emits a single [`ChangeNotification::Reset`].
    pub fn clear(&self) -> CollectionResult<()> {
        self.apply_batch(|items| {
            items.clear();
            Some(ChangeNotification::Reset)
        })
    }

    /// Applies `mutate` to the backing storage and dispatches the notification
    /// it returns, if any. Fails without mutating while a dispatch is running.
    pub(crate) fn apply_batch<F>(&self, mutate: F) -> CollectionResult<()>
    where
        F: FnOnce(&mut Vec<T>) -> Option<ChangeNotification<T>>,
    {
        self.shared.monitor.check()?;
        let change = {
            let mut items = self.shared.items.borrow_mut();
            mutate(&mut *items)
        };
        if let Some(change) = change {
            self.dispatch(&change);
        }
        Ok(())
    }

    fn dispatch(&self, change: &ChangeNotification<T>) {
        let callbacks: Vec<Rc<Callback<T>>> = {
            let mut subscribers = self.shared.subscribers.borrow_mut();
            subscribers.retain(|weak| weak.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        trace!(subscribers = callbacks.len(), "dispatching change notification");

        let _dispatch = self.shared.monitor.enter();
        for callback in callbacks {
            callback(change);
        }
    }
}

impl<T: Clone + PartialEq + 'static> ObservableVec<T> {
    pub fn contains(&self, item: &T) -> bool {
        self.shared.items.borrow().contains(item)
    }

    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.shared.items.borrow().iter().position(|x| x == item)
    }

    /// Removes the first occurrence of `item`. Returns `false` if absent.
    pub fn remove(&self, item: &T) -> CollectionResult<bool> {
        self.shared.monitor.check()?;
        match self.index_of(item) {
            Some(index) => self.remove_at(index).map(|_| true),
            None => Ok(false),
        }
    }

    /// Replaces the first occurrence of `old` by `new`.
    pub fn replace_item(&self, old: &T, new: T) -> CollectionResult<()> {
        self.shared.monitor.check()?;
        let index = self.index_of(old).ok_or_else(|| {
            CollectionError::InvalidOperation("the item to replace does not exist in the sequence".into())
        })?;
        self.replace_at(index, new).map(|_| ())
    }
}
