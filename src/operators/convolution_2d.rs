use crate::graph::{
    axis::Axis,
    error::IRError,
    operator::{ExecContext, Operator},
    variable::Variable,
    Graph, VariableId,
};

use super::{
    util::{
        extent, floor_div, incompatible, no_overflow, output_extent, positive, publish_like,
        weight_out_channels, SpatialArg, Window2D,
    },
    Parameters,
};

const NAME: &str = "Convolution2D";

/// 2D convolution.
///
/// Signature: `y = op(x, w)`. `w` is laid out over {C, H, W, N} in any order,
/// canonically CHWN, where C counts input channels and N output channels.
/// `y` has the same order as `x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Convolution2D {
    window: Window2D,
    dilation: (usize, usize),
    dilated_ksize: (usize, usize),
}

fn dilate(ksize: usize, dilation: usize) -> Option<usize> {
    dilation.checked_mul(ksize - 1)?.checked_add(1)
}

impl Convolution2D {
    pub fn new(
        ksize: impl Into<SpatialArg>,
        stride: impl Into<SpatialArg>,
        padding: impl Into<SpatialArg>,
    ) -> Result<Self, IRError> {
        let window = Window2D::new(NAME, ksize, stride, padding)?;
        Ok(Convolution2D {
            window,
            dilation: (1, 1),
            dilated_ksize: window.ksize,
        })
    }

    /// The dilated kernel must fit in `usize`.
    pub fn with_dilation(mut self, dilation: impl Into<SpatialArg>) -> Result<Self, IRError> {
        let (dh, dw) = positive(NAME, "dilation", dilation)?;
        let (kh, kw) = self.window.ksize;
        match (dilate(kh, dh), dilate(kw, dw)) {
            (Some(dkh), Some(dkw)) => {
                self.dilation = (dh, dw);
                self.dilated_ksize = (dkh, dkw);
                Ok(self)
            }
            _ => Err(IRError::InvalidParameter {
                operator: NAME,
                parameter: "dilation",
                value: (dh as i128, dw as i128),
            }),
        }
    }

    pub fn window(&self) -> &Window2D {
        &self.window
    }

    pub fn dilation(&self) -> (usize, usize) {
        self.dilation
    }

    /// Kernel extent once dilation is applied, as `(height, width)`.
    pub fn dilated_ksize(&self) -> (usize, usize) {
        self.dilated_ksize
    }

    pub fn apply(self, graph: &mut Graph, x: VariableId, w: VariableId) -> Result<VariableId, IRError> {
        Ok(graph.apply(None, self, &[("x", x), ("w", w)])?[0])
    }

    fn convolved(&self, name: &str, x: &Variable, axis: Axis) -> Result<usize, IRError> {
        let input = extent(x, axis)?;
        let (_, s, p) = self.window.along(axis);
        let (dkh, dkw) = self.dilated_ksize;
        let dk = if axis == Axis::W { dkw } else { dkh };
        let dk = dk as i128;
        let padded = no_overflow(name, axis, p.checked_mul(2).and_then(|p| input.checked_add(p)))?;
        if padded < dk {
            return Err(incompatible(
                name,
                format!(
                    "dilated kernel {} is larger than padded input {} along {}",
                    dk, padded, axis
                ),
            ));
        }
        output_extent(name, axis, floor_div(padded - dk, s) + 1)
    }
}

impl Operator for Convolution2D {
    fn kind(&self) -> &'static str {
        NAME
    }

    fn input_slots(&self) -> &'static [&'static str] {
        &["x", "w"]
    }

    fn parameters(&self) -> Parameters {
        Parameters::Convolution2D {
            window: self.window,
            dilation: self.dilation,
        }
    }

    fn exec(&self, ctx: &mut ExecContext<'_>) -> Result<(), IRError> {
        let x = ctx.input("x")?;
        let w = ctx.input("w")?;
        let name = ctx.name().to_string();
        let c = weight_out_channels(&name, x, w, self.window.ksize)?;
        let n = x.size_of(Axis::N)?;
        let height = self.convolved(&name, x, Axis::H)?;
        let width = self.convolved(&name, x, Axis::W)?;
        publish_like(ctx, x, [n, height, width, c])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::graph::order::{ORDER_CHWN, ORDER_HWCN, ORDER_NCHW, ORDER_NHWC};

    fn convolve(
        op: Convolution2D,
        x: Variable,
        w: Variable,
    ) -> Result<(Graph, VariableId), IRError> {
        let mut graph = Graph::new();
        let x = graph.add_input(x);
        let w = graph.add_variable(w);
        let y = op.apply(&mut graph, x, w)?;
        Ok((graph, y))
    }

    #[test]
    fn same_padding() {
        let x = Variable::new(vec![2, 6, 8, 3], ORDER_NHWC.clone()).unwrap();
        let w = Variable::new(vec![3, 3, 3, 16], ORDER_CHWN.clone()).unwrap();
        let (graph, y) = convolve(Convolution2D::new(3, 1, 1).unwrap(), x, w).unwrap();
        assert_eq!(graph.variable(y).unwrap().shape(), &[2, 6, 8, 16]);
    }

    #[test]
    fn strided_and_dilated() {
        let x = Variable::new(vec![1, 4, 9, 9], ORDER_NCHW.clone()).unwrap();
        let w = Variable::new(vec![3, 3, 4, 8], ORDER_HWCN.clone()).unwrap();
        let op = Convolution2D::new(3, 2, 0).unwrap().with_dilation(2).unwrap();
        assert_eq!(op.dilated_ksize(), (5, 5));
        let (graph, y) = convolve(op, x, w).unwrap();
        let y = graph.variable(y).unwrap();
        assert_eq!(y.order(), &*ORDER_NCHW);
        // (9 - 5) / 2 + 1
        assert_eq!(y.shape(), &[1, 8, 3, 3]);
        let node = graph.operators().next().unwrap();
        assert_eq!(node.tensorwise_axes(), vec![Axis::N, Axis::C]);
    }

    #[test]
    fn channel_mismatch_is_incompatible() {
        let x = Variable::new(vec![2, 6, 8, 3], ORDER_NHWC.clone()).unwrap();
        let w = Variable::new(vec![4, 3, 3, 16], ORDER_CHWN.clone()).unwrap();
        let res = convolve(Convolution2D::new(3, 1, 1).unwrap(), x, w);
        assert!(matches!(res, Err(IRError::IncompatibleShape { .. })));
    }

    #[test]
    fn kernel_mismatch_is_incompatible() {
        let x = Variable::new(vec![2, 6, 8, 3], ORDER_NHWC.clone()).unwrap();
        let w = Variable::new(vec![3, 5, 5, 16], ORDER_CHWN.clone()).unwrap();
        let res = convolve(Convolution2D::new(3, 1, 1).unwrap(), x, w);
        assert!(matches!(res, Err(IRError::IncompatibleShape { .. })));
    }

    #[test]
    fn huge_dilation_does_not_overflow() {
        let res = Convolution2D::new(4, 1, 0)
            .unwrap()
            .with_dilation(i64::MAX as usize);
        assert!(matches!(
            res,
            Err(IRError::InvalidParameter {
                parameter: "dilation",
                ..
            })
        ));

        // 2^62 * 2 + 1 fits, but exceeds the padded input
        let op = Convolution2D::new(3, 1, 0)
            .unwrap()
            .with_dilation(1usize << 62)
            .unwrap();
        assert_eq!(op.dilated_ksize(), ((1 << 63) + 1, (1 << 63) + 1));
        let x = Variable::new(vec![1, 9, 9, 3], ORDER_NHWC.clone()).unwrap();
        let w = Variable::new(vec![3, 3, 3, 2], ORDER_CHWN.clone()).unwrap();
        let res = convolve(op, x, w);
        assert!(matches!(res, Err(IRError::IncompatibleShape { .. })));
    }

    #[test]
    fn invalid_dilation() {
        let res = Convolution2D::new(3, 1, 0).unwrap().with_dilation((1, 0));
        assert!(matches!(
            res,
            Err(IRError::InvalidParameter {
                parameter: "dilation",
                ..
            })
        ));
    }
}
