//! Spaces: sets of observations and actions.
mod index;

pub use index::IndexSpace;

use rand::distributions::Distribution;
use std::fmt::{Debug, Display};

/// A mathematical space that can be sampled from.
pub trait Space: Display + Debug + Distribution<<Self as Space>::Element> {
    type Element;

    /// Check if the space contains a particular value
    fn contains(&self, value: &Self::Element) -> bool;
}

/// A space containing finitely many elements.
pub trait FiniteSpace: Space {
    /// The number of elements in the space.
    fn size(&self) -> usize;

    /// Get the index of an element.
    fn to_index(&self, element: &Self::Element) -> usize;

    /// Try to convert an index to an element.
    ///
    /// Returns `None` if the index is out of range.
    fn from_index(&self, index: usize) -> Option<Self::Element>;
}
