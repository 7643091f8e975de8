use std::fmt;

/// Logical tensor dimension.
///
/// The declaration order is the canonical order used by [`Order::canonical`](super::order::Order::canonical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    /// Batch
    N,
    /// Channel
    C,
    /// Height
    H,
    /// Width
    W,
    /// Time
    T,
}

impl Axis {
    pub const ALL: [Axis; 5] = [Axis::N, Axis::C, Axis::H, Axis::W, Axis::T];

    pub fn label(self) -> char {
        match self {
            Axis::N => 'N',
            Axis::C => 'C',
            Axis::H => 'H',
            Axis::W => 'W',
            Axis::T => 'T',
        }
    }

    /// Height and width, the axes spatial operators reduce or expand.
    pub fn is_spatial(self) -> bool {
        matches!(self, Axis::H | Axis::W)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
