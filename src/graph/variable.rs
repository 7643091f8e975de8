use std::{collections::BTreeMap, fmt};

use itertools::Itertools;

use super::{axis::Axis, error::IRError, order::Order};

/// A tensor flowing through the graph, described by its shape and the order
/// labelling each physical dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    shape: Vec<usize>,
    order: Order,
}

impl Variable {
    pub fn new(shape: Vec<usize>, order: Order) -> Result<Self, IRError> {
        if shape.len() != order.ndim() {
            return Err(IRError::ShapeOrderMismatch { shape, order });
        }
        if shape.iter().any(|extent| *extent == 0) {
            return Err(IRError::InvalidShape { shape });
        }
        Ok(Variable { shape, order })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    /// Extent of each logical axis, independent of physical position.
    pub fn shape_dict(&self) -> BTreeMap<Axis, usize> {
        self.order
            .axes()
            .iter()
            .cloned()
            .zip(self.shape.iter().cloned())
            .collect()
    }

    pub fn size_of(&self, axis: Axis) -> Result<usize, IRError> {
        Ok(self.shape[self.order.position(axis)?])
    }

    /// Relabel the physical dimensions to `order`, keeping each logical
    /// axis's extent.
    ///
    /// Returns a new variable; `self` is left untouched. Only the operator
    /// producing a variable retargets it, before publishing it to the graph.
    pub fn change_order(&self, order: &Order) -> Result<Variable, IRError> {
        let permutation = self.order.permutation_to(order)?;
        Ok(Variable {
            shape: permutation.into_iter().map(|i| self.shape[i]).collect(),
            order: order.clone(),
        })
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.shape.iter().join(", "), self.order)
    }
}
