use std::fmt;

/// A cheap type to refer to IR temporaries unambiguously
///
/// Temporaries are numbered per function, starting at zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Variable(usize);

impl Variable {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Advance internal counter to next variable
    pub fn advance(&mut self) {
        self.0 += 1;
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}
