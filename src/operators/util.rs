use num::{Integer, ToPrimitive};

use crate::graph::{
    axis::Axis, error::IRError, operator::ExecContext, order::ORDER_NHWC, variable::Variable,
};

/// A spatial parameter given either once for both height and width, or as an
/// explicit `(height, width)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialArg(i128, i128);

impl From<i32> for SpatialArg {
    fn from(value: i32) -> Self {
        SpatialArg(value.into(), value.into())
    }
}

impl From<(i32, i32)> for SpatialArg {
    fn from(value: (i32, i32)) -> Self {
        SpatialArg(value.0.into(), value.1.into())
    }
}

impl From<usize> for SpatialArg {
    fn from(value: usize) -> Self {
        SpatialArg(value as i128, value as i128)
    }
}

impl From<(usize, usize)> for SpatialArg {
    fn from(value: (usize, usize)) -> Self {
        SpatialArg(value.0 as i128, value.1 as i128)
    }
}

/// Window parameters must lie in `min..=i64::MAX`.
fn checked(
    operator: &'static str,
    parameter: &'static str,
    arg: SpatialArg,
    min: i128,
) -> Result<(usize, usize), IRError> {
    let SpatialArg(h, w) = arg;
    let range = min..=i128::from(i64::MAX);
    match (h.to_usize(), w.to_usize()) {
        (Some(uh), Some(uw)) if range.contains(&h) && range.contains(&w) => Ok((uh, uw)),
        _ => Err(IRError::InvalidParameter {
            operator,
            parameter,
            value: (h, w),
        }),
    }
}

pub(crate) fn positive(
    operator: &'static str,
    parameter: &'static str,
    arg: impl Into<SpatialArg>,
) -> Result<(usize, usize), IRError> {
    checked(operator, parameter, arg.into(), 1)
}

pub(crate) fn non_negative(
    operator: &'static str,
    parameter: &'static str,
    arg: impl Into<SpatialArg>,
) -> Result<(usize, usize), IRError> {
    checked(operator, parameter, arg.into(), 0)
}

/// Kernel, stride and padding of a 2D sliding window, as `(height, width)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window2D {
    pub ksize: (usize, usize),
    pub stride: (usize, usize),
    pub padding: (usize, usize),
}

impl Window2D {
    /// Validate the raw parameters of `operator`. Kernel and stride must be
    /// positive, padding non-negative.
    pub fn new(
        operator: &'static str,
        ksize: impl Into<SpatialArg>,
        stride: impl Into<SpatialArg>,
        padding: impl Into<SpatialArg>,
    ) -> Result<Self, IRError> {
        Ok(Window2D {
            ksize: positive(operator, "ksize", ksize)?,
            stride: positive(operator, "stride", stride)?,
            padding: non_negative(operator, "padding", padding)?,
        })
    }

    /// `(kernel, stride, padding)` along `axis`, which must be H or W.
    pub(crate) fn along(&self, axis: Axis) -> (i128, i128, i128) {
        let pick = |pair: (usize, usize)| (if axis == Axis::W { pair.1 } else { pair.0 }) as i128;
        (pick(self.ksize), pick(self.stride), pick(self.padding))
    }
}

pub(crate) fn extent(variable: &Variable, axis: Axis) -> Result<i128, IRError> {
    Ok(variable.size_of(axis)? as i128)
}

pub(crate) fn floor_div(numerator: i128, denominator: i128) -> i128 {
    Integer::div_floor(&numerator, &denominator)
}

/// Unwrap the result of checked window arithmetic along `axis`.
pub(crate) fn no_overflow(operator: &str, axis: Axis, value: Option<i128>) -> Result<i128, IRError> {
    value.ok_or_else(|| {
        incompatible(
            operator,
            format!("window arithmetic along {} overflows", axis),
        )
    })
}

/// Reject an inferred extent that is not positive or does not fit in `usize`.
pub(crate) fn output_extent(operator: &str, axis: Axis, value: i128) -> Result<usize, IRError> {
    match value.to_usize() {
        Some(extent) if extent > 0 => Ok(extent),
        None if value > 0 => Err(incompatible(
            operator,
            format!("inferred extent {} along {} is too large", value, axis),
        )),
        _ => Err(incompatible(
            operator,
            format!("inferred extent {} along {} is not positive", value, axis),
        )),
    }
}

pub(crate) fn incompatible(operator: &str, reason: String) -> IRError {
    IRError::IncompatibleShape {
        operator: operator.to_string(),
        reason,
    }
}

/// Publish an output built from NHWC extents as slot `y`, in the same order
/// as `x`, and mark every non-spatial axis of `x` as `Tensorwise`.
pub(crate) fn publish_like(
    ctx: &mut ExecContext<'_>,
    x: &Variable,
    nhwc: [usize; 4],
) -> Result<(), IRError> {
    let y = Variable::new(nhwc.to_vec(), ORDER_NHWC.clone())?.change_order(x.order())?;
    ctx.append_output("y", y)?;
    for axis in x.order().axes() {
        if !axis.is_spatial() {
            ctx.tensorwise(*axis);
        }
    }
    Ok(())
}

/// Check a `w` tensor laid out over {N, C, H, W} against `x` and the kernel
/// size, returning the number of output channels (`w`'s N).
pub(crate) fn weight_out_channels(
    operator: &str,
    x: &Variable,
    w: &Variable,
    ksize: (usize, usize),
) -> Result<usize, IRError> {
    if !w.order().is_permutation_of(&ORDER_NHWC) {
        return Err(incompatible(
            operator,
            format!("weight order {} must be a permutation of NHWC", w.order()),
        ));
    }
    let kernel = (w.size_of(Axis::H)?, w.size_of(Axis::W)?);
    if kernel != ksize {
        return Err(incompatible(
            operator,
            format!("weight kernel {:?} does not match ksize {:?}", kernel, ksize),
        ));
    }
    let (x_channels, w_channels) = (x.size_of(Axis::C)?, w.size_of(Axis::C)?);
    if x_channels != w_channels {
        return Err(incompatible(
            operator,
            format!(
                "input has {} channels but weight expects {}",
                x_channels, w_channels
            ),
        ));
    }
    w.size_of(Axis::N)
}
