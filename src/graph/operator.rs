use std::{collections::BTreeMap, fmt};

use super::{
    attribute::{Attribute, Diagnostic},
    axis::Axis,
    error::IRError,
    variable::Variable,
    OperatorId, VariableId,
};
use crate::operators::Parameters;

/// Shape and order inference for one kind of graph node.
///
/// Implementations hold only their typed configuration. Inputs, outputs and
/// attributes live on the [`OperatorNode`] the graph builds around them.
pub trait Operator: CloneableOperator + fmt::Debug + Send + Sync {
    fn kind(&self) -> &'static str;
    fn input_slots(&self) -> &'static [&'static str];
    fn parameters(&self) -> Parameters;
    /// Infer outputs from the bound inputs and record them on `ctx`.
    fn exec(&self, ctx: &mut ExecContext<'_>) -> Result<(), IRError>;
}

pub trait CloneableOperator {
    fn internal_clone(&self) -> Box<dyn Operator>;
}

impl<G> CloneableOperator for G
where
    G: Operator + Clone + 'static,
{
    fn internal_clone(&self) -> Box<dyn Operator> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Operator> {
    fn clone(&self) -> Self {
        self.internal_clone()
    }
}

/// An operator placed in a graph, with its bindings.
///
/// Once executed the node is frozen: no further bindings are accepted.
#[derive(Debug, Clone)]
pub struct OperatorNode {
    pub(crate) id: OperatorId,
    pub(crate) name: String,
    pub(crate) operator: Box<dyn Operator>,
    pub(crate) inputs: BTreeMap<&'static str, VariableId>,
    pub(crate) outputs: BTreeMap<&'static str, VariableId>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) frozen: bool,
}

impl OperatorNode {
    pub fn id(&self) -> OperatorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &'static str {
        self.operator.kind()
    }

    pub fn operator(&self) -> &dyn Operator {
        &*self.operator
    }

    pub fn parameters(&self) -> Parameters {
        self.operator.parameters()
    }

    pub fn inputs(&self) -> &BTreeMap<&'static str, VariableId> {
        &self.inputs
    }

    pub fn outputs(&self) -> &BTreeMap<&'static str, VariableId> {
        &self.outputs
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Axes carrying a `Tensorwise` attribute, in attachment order.
    pub fn tensorwise_axes(&self) -> Vec<Axis> {
        self.attributes
            .iter()
            .filter_map(|attribute| match attribute {
                Attribute::Tensorwise { axis, .. } => Some(*axis),
            })
            .collect()
    }
}

/// Everything an executing operator may read or record.
pub struct ExecContext<'g> {
    id: OperatorId,
    name: &'g str,
    inputs: BTreeMap<&'static str, &'g Variable>,
    outputs: Vec<(&'static str, Variable)>,
    attributes: Vec<Attribute>,
    diagnostics: Vec<Diagnostic>,
}

pub(crate) struct ExecOutcome {
    pub(crate) outputs: Vec<(&'static str, Variable)>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl<'g> ExecContext<'g> {
    pub(crate) fn new(
        id: OperatorId,
        name: &'g str,
        inputs: BTreeMap<&'static str, &'g Variable>,
    ) -> Self {
        ExecContext {
            id,
            name,
            inputs,
            outputs: Vec::new(),
            attributes: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn id(&self) -> OperatorId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn input(&self, slot: &str) -> Result<&'g Variable, IRError> {
        self.inputs
            .get(slot)
            .copied()
            .ok_or_else(|| IRError::MissingInput {
                operator: self.name.to_string(),
                slot: slot.to_string(),
            })
    }

    pub fn append_output(&mut self, slot: &'static str, variable: Variable) -> Result<(), IRError> {
        if self.outputs.iter().any(|(existing, _)| *existing == slot) {
            return Err(IRError::DuplicateSlot {
                operator: self.name.to_string(),
                slot: slot.to_string(),
            });
        }
        self.outputs.push((slot, variable));
        Ok(())
    }

    /// Attach an attribute. Attaching the same attribute twice keeps one.
    pub fn add_attribute(&mut self, attribute: Attribute) {
        if !self.attributes.contains(&attribute) {
            self.attributes.push(attribute);
        }
    }

    pub fn tensorwise(&mut self, axis: Axis) {
        let operator = self.id;
        self.add_attribute(Attribute::Tensorwise { operator, axis });
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!("[{}] {}", self.name, diagnostic);
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn finish(self) -> ExecOutcome {
        ExecOutcome {
            outputs: self.outputs,
            attributes: self.attributes,
            diagnostics: self.diagnostics,
        }
    }
}
