use crate::graph::{
    attribute::Diagnostic,
    axis::Axis,
    error::IRError,
    operator::{ExecContext, Operator},
    variable::Variable,
    Graph, VariableId,
};

use super::{
    util::{
        extent, floor_div, incompatible, no_overflow, output_extent, publish_like, SpatialArg,
        Window2D,
    },
    Parameters,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolingKind {
    Max,
    Average {
        /// Divide by the number of non-padding elements in the window
        /// instead of the full window size.
        divide_without_padding: bool,
    },
}

impl PoolingKind {
    fn name(self) -> &'static str {
        match self {
            PoolingKind::Max => "MaxPooling2D",
            PoolingKind::Average { .. } => "AveragePooling2D",
        }
    }
}

/// Spatial pooling over H and W.
///
/// Signature: `y = op(x)`. `y` has the same order as `x`; N and C pass
/// through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pooling2D {
    pooling: PoolingKind,
    window: Window2D,
}

impl Pooling2D {
    pub fn new(
        pooling: PoolingKind,
        ksize: impl Into<SpatialArg>,
        stride: impl Into<SpatialArg>,
        padding: impl Into<SpatialArg>,
    ) -> Result<Self, IRError> {
        Ok(Pooling2D {
            pooling,
            window: Window2D::new(pooling.name(), ksize, stride, padding)?,
        })
    }

    pub fn max(
        ksize: impl Into<SpatialArg>,
        stride: impl Into<SpatialArg>,
        padding: impl Into<SpatialArg>,
    ) -> Result<Self, IRError> {
        Pooling2D::new(PoolingKind::Max, ksize, stride, padding)
    }

    pub fn average(
        ksize: impl Into<SpatialArg>,
        stride: impl Into<SpatialArg>,
        padding: impl Into<SpatialArg>,
        divide_without_padding: bool,
    ) -> Result<Self, IRError> {
        Pooling2D::new(
            PoolingKind::Average {
                divide_without_padding,
            },
            ksize,
            stride,
            padding,
        )
    }

    pub fn pooling(&self) -> PoolingKind {
        self.pooling
    }

    pub fn window(&self) -> &Window2D {
        &self.window
    }

    /// Add this operator to `graph` applied to `x`, returning `y`.
    pub fn apply(self, graph: &mut Graph, x: VariableId) -> Result<VariableId, IRError> {
        Ok(graph.apply(None, self, &[("x", x)])?[0])
    }

    /// Pooled extent along `axis`, and whether trailing input is left out.
    fn pooled(&self, name: &str, x: &Variable, axis: Axis) -> Result<(usize, bool), IRError> {
        let input = extent(x, axis)?;
        let (k, s, p) = self.window.along(axis);
        let padded = no_overflow(name, axis, p.checked_mul(2).and_then(|p| input.checked_add(p)))?;
        if padded < k {
            return Err(incompatible(
                name,
                format!(
                    "kernel {} is larger than padded input {} along {}",
                    k, padded, axis
                ),
            ));
        }
        let numerator = no_overflow(name, axis, padded.checked_add(s - k - 1))?;
        let pooled = floor_div(numerator, s) + 1;
        Ok((output_extent(name, axis, pooled)?, (padded - k) % s != 0))
    }
}

impl Operator for Pooling2D {
    fn kind(&self) -> &'static str {
        self.pooling.name()
    }

    fn input_slots(&self) -> &'static [&'static str] {
        &["x"]
    }

    fn parameters(&self) -> Parameters {
        Parameters::Pooling2D {
            kind: self.pooling,
            window: self.window,
        }
    }

    fn exec(&self, ctx: &mut ExecContext<'_>) -> Result<(), IRError> {
        let x = ctx.input("x")?;
        let name = ctx.name().to_string();
        let n = x.size_of(Axis::N)?;
        let c = x.size_of(Axis::C)?;
        let (h, h_ignored) = self.pooled(&name, x, Axis::H)?;
        let (w, w_ignored) = self.pooled(&name, x, Axis::W)?;

        let ignored: Vec<Axis> = [(Axis::H, h_ignored), (Axis::W, w_ignored)]
            .iter()
            .filter(|(_, ignored)| *ignored)
            .map(|(axis, _)| *axis)
            .collect();
        if !ignored.is_empty() {
            let operator = ctx.id();
            ctx.report(Diagnostic::EdgeIgnored {
                operator,
                axes: ignored,
            });
        }

        publish_like(ctx, x, [n, h, w, c])
    }
}
