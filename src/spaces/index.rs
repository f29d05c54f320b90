use super::{FiniteSpace, Space};
use rand::distributions::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An index space; integers 0 .. size-1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpace {
    pub size: usize,
}

impl IndexSpace {
    pub const fn new(size: usize) -> Self {
        Self { size }
    }
}

impl fmt::Display for IndexSpace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "IndexSpace({})", self.size)
    }
}

impl Space for IndexSpace {
    type Element = usize;

    fn contains(&self, value: &Self::Element) -> bool {
        value < &self.size
    }
}

impl FiniteSpace for IndexSpace {
    fn size(&self) -> usize {
        self.size
    }

    fn to_index(&self, element: &Self::Element) -> usize {
        *element
    }

    fn from_index(&self, index: usize) -> Option<Self::Element> {
        if index < self.size {
            Some(index)
        } else {
            None
        }
    }
}

impl Distribution<<Self as Space>::Element> for IndexSpace {
    /// # Panics
    /// If the space is empty.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> <Self as Space>::Element {
        rng.gen_range(0..self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn contains_bounds() {
        let space = IndexSpace::new(3);
        assert!(space.contains(&0));
        assert!(space.contains(&2));
        assert!(!space.contains(&3));
    }

    #[test]
    fn index_round_trip() {
        let space = IndexSpace::new(4);
        assert_eq!(space.from_index(space.to_index(&2)), Some(2));
        assert_eq!(space.from_index(4), None);
    }

    #[test]
    fn samples_in_space() {
        let space = IndexSpace::new(5);
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            assert!(space.contains(&space.sample(&mut rng)));
        }
    }
}
