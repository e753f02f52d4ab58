//! Lazy sequence helpers.
//!
//! Both iterators are finite and `Clone`; cloning one before consuming it
//! gives a restartable sequence.

use std::fmt;
use std::marker::PhantomData;
use std::str::{FromStr, Split};

use crate::domain::error::{CollectionError, CollectionResult};

/// Values of a delimited string, parsed on demand.
pub struct Delimited<'a, T> {
    parts: Split<'a, &'a str>,
    _target: PhantomData<fn() -> T>,
}

impl<T> Clone for Delimited<'_, T> {
    fn clone(&self) -> Self {
        Self {
            parts: self.parts.clone(),
            _target: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Delimited<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delimited").field("parts", &self.parts).finish()
    }
}

impl<T> Iterator for Delimited<'_, T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    type Item = CollectionResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let part = self.parts.by_ref().find(|part| !part.is_empty())?;
        Some(part.parse::<T>().map_err(|e| CollectionError::Parse {
            value: part.to_string(),
            message: e.to_string(),
        }))
    }
}

/// Splits `input` on `separator` and parses every non-empty entry as `T`.
///
/// Entries are not trimmed. Fails when `separator` is empty.
pub fn parse_delimited<'a, T>(input: &'a str, separator: &'a str) -> CollectionResult<Delimited<'a, T>>
where
    T: FromStr,
{
    if separator.is_empty() {
        return Err(CollectionError::invalid_argument(
            "separator",
            "must not be empty",
        ));
    }
    Ok(Delimited {
        parts: input.split(separator),
        _target: PhantomData,
    })
}

/// Consecutive windows of at most `size` items.
#[derive(Debug, Clone)]
pub struct Windows<I> {
    source: I,
    size: usize,
}

impl<I: Iterator> Iterator for Windows<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let window: Vec<_> = self.source.by_ref().take(self.size).collect();
        (!window.is_empty()).then_some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (low, high) = self.source.size_hint();
        (low.div_ceil(self.size), high.map(|h| h.div_ceil(self.size)))
    }
}

/// Groups `items` into windows of `size`; the last window may be shorter.
pub fn windows<I: IntoIterator>(items: I, size: usize) -> CollectionResult<Windows<I::IntoIter>> {
    if size == 0 {
        return Err(CollectionError::invalid_argument(
            "size",
            "window size must be at least 1",
        ));
    }
    Ok(Windows {
        source: items.into_iter(),
        size,
    })
}
