use std::fmt;

use itertools::Itertools;

use super::{axis::Axis, OperatorId};

/// Metadata an operator attaches to itself during exec, read by later passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// The operator acts independently along `axis`, so a backend may split
    /// or batch the work along it freely.
    Tensorwise { operator: OperatorId, axis: Axis },
}

impl Attribute {
    pub fn operator(&self) -> OperatorId {
        match self {
            Attribute::Tensorwise { operator, .. } => *operator,
        }
    }

    pub fn axis(&self) -> Option<Axis> {
        match self {
            Attribute::Tensorwise { axis, .. } => Some(*axis),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Tensorwise { axis, .. } => write!(f, "Tensorwise({})", axis),
        }
    }
}

/// Non-fatal findings reported while executing an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The window configuration leaves trailing input elements uncovered
    /// along `axes`. Backends disagree on which edge is dropped, so their
    /// results may differ slightly.
    EdgeIgnored { operator: OperatorId, axes: Vec<Axis> },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::EdgeIgnored { axes, .. } => write!(
                f,
                "edge is ignored along {}; which edge (left / right) differs between backends",
                axes.iter().join(", ")
            ),
        }
    }
}
