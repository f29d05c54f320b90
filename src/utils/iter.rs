//! Iterator utilities.

/// Index and value of the first maximal element of a sequence of floats.
pub trait FirstArgMax {
    /// The first index holding the maximum value, together with that value.
    ///
    /// Later elements replace the running maximum only if strictly greater,
    /// so ties resolve to the lowest index.
    /// Returns `None` for an empty sequence.
    fn first_argmax(self) -> Option<(usize, f64)>;
}

impl<I> FirstArgMax for I
where
    I: IntoIterator,
    I::Item: Into<f64>,
{
    fn first_argmax(self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, x) in self.into_iter().enumerate() {
            let x = x.into();
            match best {
                Some((_, value)) if !(x > value) => {}
                _ => best = Some((i, x)),
            }
        }
        best
    }
}
