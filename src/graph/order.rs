use std::{collections::BTreeSet, fmt};

use itertools::Itertools;
use lazy_static::lazy_static;

use super::{axis::Axis, error::IRError};

/// Physical arrangement of a tensor's logical axes.
///
/// An order never repeats an axis. Its length is the rank of every
/// [`Variable`](super::variable::Variable) it labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Order {
    axes: Vec<Axis>,
}

macro_rules! predefined_order {
    ($($name:ident => [$($axis:ident),+]),+ $(,)?) => {
        lazy_static! {
            $(
                pub static ref $name: Order = Order {
                    axes: vec![$(Axis::$axis),+],
                };
            )+
        }
    };
}

predefined_order! {
    ORDER_NHWC => [N, H, W, C],
    ORDER_NCHW => [N, C, H, W],
    ORDER_CHWN => [C, H, W, N],
    ORDER_HWCN => [H, W, C, N],
    ORDER_HWNC => [H, W, N, C],
    ORDER_CNHW => [C, N, H, W],
    ORDER_NC => [N, C],
    ORDER_CN => [C, N],
    ORDER_NTC => [N, T, C],
}

impl Order {
    pub fn new(axes: Vec<Axis>) -> Result<Self, IRError> {
        if axes.iter().unique().count() != axes.len() {
            return Err(IRError::InvalidOrder { axes });
        }
        Ok(Order { axes })
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    pub fn contains(&self, axis: Axis) -> bool {
        self.axes.contains(&axis)
    }

    /// Physical index of `axis`.
    pub fn position(&self, axis: Axis) -> Result<usize, IRError> {
        self.axes
            .iter()
            .position(|a| *a == axis)
            .ok_or_else(|| IRError::AxisNotFound {
                axis,
                order: self.clone(),
            })
    }

    pub fn axis_set(&self) -> BTreeSet<Axis> {
        self.axes.iter().cloned().collect()
    }

    /// True when both orders hold the same set of axes, in any arrangement.
    pub fn is_permutation_of(&self, other: &Order) -> bool {
        self.ndim() == other.ndim() && self.axis_set() == other.axis_set()
    }

    /// The same axes sorted by [`Axis`]'s total order.
    pub fn canonical(&self) -> Order {
        Order {
            axes: self.axes.iter().cloned().sorted().collect(),
        }
    }

    /// For each position of `target`, the index of that axis in `self`.
    ///
    /// Reading a tensor laid out in `self` through this permutation yields the
    /// layout of `target`.
    pub fn permutation_to(&self, target: &Order) -> Result<Vec<usize>, IRError> {
        if !self.is_permutation_of(target) {
            return Err(IRError::AxisSetMismatch {
                from: self.clone(),
                to: target.clone(),
            });
        }
        target.axes.iter().map(|axis| self.position(*axis)).collect()
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.axes.iter().map(|a| a.label()).join(""))
    }
}
