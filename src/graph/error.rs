use thiserror::Error;

use super::{axis::Axis, order::Order};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IRError {
    #[error("Order {axes:?} contains a repeated axis")]
    InvalidOrder { axes: Vec<Axis> },
    #[error("Shape {shape:?} does not match order {order} of rank {}", .order.ndim())]
    ShapeOrderMismatch { shape: Vec<usize>, order: Order },
    #[error("Shape {shape:?} contains a zero extent")]
    InvalidShape { shape: Vec<usize> },
    #[error("Operator {operator} received invalid {parameter} {value:?}")]
    InvalidParameter {
        operator: &'static str,
        parameter: &'static str,
        value: (i128, i128),
    },
    #[error("Operator {operator} already has an input bound to slot {slot:?}")]
    DuplicateSlot { operator: String, slot: String },
    #[error("Operator {operator} has no slot named {slot:?}")]
    SlotNotSupported { operator: String, slot: String },
    #[error("Operator {operator} was executed without an input for slot {slot:?}")]
    MissingInput { operator: String, slot: String },
    #[error("Operator {operator} has already been executed")]
    OperatorFrozen { operator: String },
    #[error("Axis {axis} is not present in order {order}")]
    AxisNotFound { axis: Axis, order: Order },
    #[error("Cannot change order {from} to {to}: axis sets differ")]
    AxisSetMismatch { from: Order, to: Order },
    #[error("Operator {operator} cannot infer output shape: {reason}")]
    IncompatibleShape { operator: String, reason: String },
    #[error("Variable handle {0} does not belong to this graph")]
    UnknownVariable(String),
    #[error("Operator handle {0} does not belong to this graph")]
    UnknownOperator(String),
}
