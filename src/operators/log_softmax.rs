use crate::graph::{
    axis::Axis,
    error::IRError,
    operator::{ExecContext, Operator},
    Graph, VariableId,
};

use super::Parameters;

/// Log-softmax along one axis.
///
/// Signature: `y = op(x)`. `y` has the shape and order of `x`. Every other
/// axis is `Tensorwise`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSoftmax {
    axis: Axis,
}

impl LogSoftmax {
    pub fn new(axis: Axis) -> Self {
        LogSoftmax { axis }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn apply(self, graph: &mut Graph, x: VariableId) -> Result<VariableId, IRError> {
        Ok(graph.apply(None, self, &[("x", x)])?[0])
    }
}

impl Operator for LogSoftmax {
    fn kind(&self) -> &'static str {
        "LogSoftmax"
    }

    fn input_slots(&self) -> &'static [&'static str] {
        &["x"]
    }

    fn parameters(&self) -> Parameters {
        Parameters::LogSoftmax { axis: self.axis }
    }

    fn exec(&self, ctx: &mut ExecContext<'_>) -> Result<(), IRError> {
        let x = ctx.input("x")?;
        x.order().position(self.axis)?;
        ctx.append_output("y", x.clone())?;
        for axis in x.order().axes() {
            if *axis != self.axis {
                ctx.tensorwise(*axis);
            }
        }
        Ok(())
    }
}
