//! Concrete operators and the typed parameters backends read from them.

use crate::graph::axis::Axis;

pub mod convolution_2d;
pub mod deconvolution_2d;
pub mod log_softmax;
pub mod pooling_2d;
pub mod util;

pub use self::{
    convolution_2d::Convolution2D,
    deconvolution_2d::Deconvolution2D,
    log_softmax::LogSoftmax,
    pooling_2d::{Pooling2D, PoolingKind},
    util::{SpatialArg, Window2D},
};

/// Configuration of an operator, one variant per operator kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameters {
    Pooling2D {
        kind: PoolingKind,
        window: Window2D,
    },
    Convolution2D {
        window: Window2D,
        dilation: (usize, usize),
    },
    Deconvolution2D {
        window: Window2D,
    },
    LogSoftmax {
        axis: Axis,
    },
}

impl Parameters {
    /// The sliding window of spatial operators.
    pub fn window(&self) -> Option<&Window2D> {
        match self {
            Parameters::Pooling2D { window, .. }
            | Parameters::Convolution2D { window, .. }
            | Parameters::Deconvolution2D { window } => Some(window),
            Parameters::LogSoftmax { .. } => None,
        }
    }
}
