pub use crate::graph::{
    attribute::{Attribute, Diagnostic},
    axis::Axis,
    error::IRError,
    operator::{ExecContext, Operator, OperatorNode},
    order::{
        Order, ORDER_CHWN, ORDER_CN, ORDER_CNHW, ORDER_HWCN, ORDER_HWNC, ORDER_NC, ORDER_NCHW,
        ORDER_NHWC, ORDER_NTC,
    },
    variable::Variable,
    Graph, OperatorId, VariableId,
};
pub use crate::operators::{
    Convolution2D, Deconvolution2D, LogSoftmax, Parameters, Pooling2D, PoolingKind, SpatialArg,
    Window2D,
};
