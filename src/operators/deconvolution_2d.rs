use crate::graph::{
    axis::Axis,
    error::IRError,
    operator::{ExecContext, Operator},
    variable::Variable,
    Graph, VariableId,
};

use super::{
    util::{
        extent, no_overflow, output_extent, publish_like, weight_out_channels, SpatialArg,
        Window2D,
    },
    Parameters,
};

const NAME: &str = "Deconvolution2D";

/// 2D transposed convolution.
///
/// Signature: `y = op(x, w)`, with the same layout conventions as
/// [`Convolution2D`](super::Convolution2D). Each spatial extent grows to
/// `(in - 1) * stride - 2 * padding + ksize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deconvolution2D {
    window: Window2D,
}

impl Deconvolution2D {
    pub fn new(
        ksize: impl Into<SpatialArg>,
        stride: impl Into<SpatialArg>,
        padding: impl Into<SpatialArg>,
    ) -> Result<Self, IRError> {
        Ok(Deconvolution2D {
            window: Window2D::new(NAME, ksize, stride, padding)?,
        })
    }

    pub fn window(&self) -> &Window2D {
        &self.window
    }

    pub fn ksize(&self) -> (usize, usize) {
        self.window.ksize
    }

    pub fn apply(self, graph: &mut Graph, x: VariableId, w: VariableId) -> Result<VariableId, IRError> {
        Ok(graph.apply(None, self, &[("x", x), ("w", w)])?[0])
    }

    fn expanded(&self, name: &str, x: &Variable, axis: Axis) -> Result<usize, IRError> {
        let input = extent(x, axis)?;
        let (k, s, p) = self.window.along(axis);
        let grown = (input - 1)
            .checked_mul(s)
            .and_then(|grown| grown.checked_add(k))
            .and_then(|grown| grown.checked_sub(2 * p));
        output_extent(name, axis, no_overflow(name, axis, grown)?)
    }
}

impl Operator for Deconvolution2D {
    fn kind(&self) -> &'static str {
        NAME
    }

    fn input_slots(&self) -> &'static [&'static str] {
        &["x", "w"]
    }

    fn parameters(&self) -> Parameters {
        Parameters::Deconvolution2D {
            window: self.window,
        }
    }

    fn exec(&self, ctx: &mut ExecContext<'_>) -> Result<(), IRError> {
        let x = ctx.input("x")?;
        let w = ctx.input("w")?;
        let name = ctx.name().to_string();
        let c = weight_out_channels(&name, x, w, self.window.ksize)?;
        let n = x.size_of(Axis::N)?;
        let height = self.expanded(&name, x, Axis::H)?;
        let width = self.expanded(&name, x, Axis::W)?;
        publish_like(ctx, x, [n, height, width, c])
    }
}
