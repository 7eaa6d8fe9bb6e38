//! Non-empty vector.
//!
//! Used for the endpoint list of a [`PoolConfig`](crate::PoolConfig): a
//! configuration without any Redis endpoint cannot be constructed.

use std::fmt;
use std::ops::Index;

/// A vector holding at least one element.
///
/// # Example
///
/// ```rust
/// use redlog_core::NonEmptyVec;
///
/// let hosts = NonEmptyVec::try_from(vec!["a", "b", "c"]).unwrap();
/// assert_eq!(hosts.first(), &"a");
/// assert_eq!(hosts.len(), 3);
///
/// let empty: Vec<&str> = Vec::new();
/// assert!(NonEmptyVec::try_from(empty).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyVec<T> {
    head: T,
    tail: Vec<T>,
}

impl<T> NonEmptyVec<T> {
    /// Create a vector holding exactly one element.
    pub fn singleton(value: T) -> Self {
        NonEmptyVec {
            head: value,
            tail: Vec::new(),
        }
    }

    /// The first element, which always exists.
    pub fn first(&self) -> &T {
        &self.head
    }

    /// Number of elements, never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        1 + self.tail.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        std::iter::once(&self.head).chain(self.tail.iter())
    }
}

impl<T> TryFrom<Vec<T>> for NonEmptyVec<T> {
    type Error = EmptyVecError;

    fn try_from(vec: Vec<T>) -> Result<Self, Self::Error> {
        let mut items = vec.into_iter();
        match items.next() {
            Some(head) => Ok(NonEmptyVec {
                head,
                tail: items.collect(),
            }),
            None => Err(EmptyVecError),
        }
    }
}

impl<T> Index<usize> for NonEmptyVec<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        match index {
            0 => &self.head,
            n => &self.tail[n - 1],
        }
    }
}

impl<T: fmt::Display> fmt::Display for NonEmptyVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.head)?;
        for item in &self.tail {
            write!(f, " {}", item)?;
        }
        write!(f, "]")
    }
}

/// Returned when converting an empty `Vec` into a [`NonEmptyVec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyVecError;

impl fmt::Display for EmptyVecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot build a non-empty list from an empty one")
    }
}

impl std::error::Error for EmptyVecError {}
