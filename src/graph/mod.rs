//! Arena-backed operator/variable graph.
//!
//! Variables and operators are owned by a [`Graph`] and referred to through
//! copyable handles. A handle remembers which graph issued it, so handles
//! cannot be mixed between graphs.

use std::{collections::BTreeMap, fmt};

use log::debug;
use uuid::Uuid;

pub mod attribute;
pub mod axis;
pub mod error;
pub mod operator;
pub mod order;
pub mod variable;
mod viz;

use self::{
    error::IRError,
    operator::{ExecContext, Operator, OperatorNode},
    variable::Variable,
};

type GraphId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId {
    graph: GraphId,
    index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorId {
    graph: GraphId,
    index: usize,
}

impl VariableId {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl OperatorId {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.index)
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op{}", self.index)
    }
}

#[derive(Debug, Clone)]
struct VariableNode {
    variable: Variable,
    producer: Option<OperatorId>,
}

/// Computation graph under construction, and afterwards the read-only
/// artifact handed to backends.
#[derive(Debug, Clone)]
pub struct Graph {
    id: GraphId,
    variables: Vec<VariableNode>,
    operators: Vec<OperatorNode>,
    inputs: Vec<VariableId>,
    outputs: Vec<VariableId>,
}

impl Default for Graph {
    fn default() -> Self {
        Graph::new()
    }
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            id: Uuid::new_v4(),
            variables: Vec::new(),
            operators: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Add a variable with no producer, such as a weight.
    pub fn add_variable(&mut self, variable: Variable) -> VariableId {
        self.push_variable(variable, None)
    }

    /// Add a variable fed by the caller at run time.
    pub fn add_input(&mut self, variable: Variable) -> VariableId {
        let id = self.add_variable(variable);
        self.inputs.push(id);
        id
    }

    pub fn mark_output(&mut self, variable: VariableId) -> Result<(), IRError> {
        self.check_variable(variable)?;
        if !self.outputs.contains(&variable) {
            self.outputs.push(variable);
        }
        Ok(())
    }

    pub fn inputs(&self) -> &[VariableId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[VariableId] {
        &self.outputs
    }

    pub fn variable(&self, variable: VariableId) -> Result<&Variable, IRError> {
        let index = self.check_variable(variable)?;
        Ok(&self.variables[index].variable)
    }

    pub fn variables(&self) -> impl Iterator<Item = (VariableId, &Variable)> + '_ {
        let graph = self.id;
        self.variables
            .iter()
            .enumerate()
            .map(move |(index, node)| (VariableId { graph, index }, &node.variable))
    }

    pub fn operator(&self, operator: OperatorId) -> Result<&OperatorNode, IRError> {
        let index = self.check_operator(operator)?;
        Ok(&self.operators[index])
    }

    pub fn operators(&self) -> impl Iterator<Item = &OperatorNode> + '_ {
        self.operators.iter()
    }

    pub fn producer(&self, variable: VariableId) -> Result<Option<OperatorId>, IRError> {
        let index = self.check_variable(variable)?;
        Ok(self.variables[index].producer)
    }

    pub fn consumers(&self, variable: VariableId) -> Result<Vec<OperatorId>, IRError> {
        self.check_variable(variable)?;
        Ok(self
            .operators
            .iter()
            .filter(|node| node.inputs.values().any(|v| *v == variable))
            .map(|node| node.id)
            .collect())
    }

    /// Place `operator` in the graph. Unnamed operators are called
    /// `<kind><index>`.
    pub fn add_operator<O>(&mut self, name: Option<&str>, operator: O) -> OperatorId
    where
        O: Operator + 'static,
    {
        let id = OperatorId {
            graph: self.id,
            index: self.operators.len(),
        };
        let name = match name {
            Some(name) => name.to_string(),
            None => format!("{}{}", operator.kind(), id.index),
        };
        self.operators.push(OperatorNode {
            id,
            name,
            operator: Box::new(operator),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            attributes: Vec::new(),
            diagnostics: Vec::new(),
            frozen: false,
        });
        id
    }

    pub fn append_input(
        &mut self,
        operator: OperatorId,
        slot: &str,
        variable: VariableId,
    ) -> Result<(), IRError> {
        let index = self.check_operator(operator)?;
        self.check_variable(variable)?;
        let node = &mut self.operators[index];
        if node.frozen {
            return Err(IRError::OperatorFrozen {
                operator: node.name.clone(),
            });
        }
        let slot = match node.operator.input_slots().iter().find(|s| **s == slot) {
            Some(slot) => *slot,
            None => {
                return Err(IRError::SlotNotSupported {
                    operator: node.name.clone(),
                    slot: slot.to_string(),
                })
            }
        };
        if node.inputs.contains_key(slot) {
            return Err(IRError::DuplicateSlot {
                operator: node.name.clone(),
                slot: slot.to_string(),
            });
        }
        node.inputs.insert(slot, variable);
        Ok(())
    }

    /// Run shape inference for `operator`, publish its outputs and freeze it.
    ///
    /// Outputs are returned in the order the operator appended them. On error
    /// nothing is recorded.
    pub fn exec(&mut self, operator: OperatorId) -> Result<Vec<VariableId>, IRError> {
        let index = self.check_operator(operator)?;
        let outcome = {
            let node = &self.operators[index];
            if node.frozen {
                return Err(IRError::OperatorFrozen {
                    operator: node.name.clone(),
                });
            }
            let mut bound = BTreeMap::new();
            for slot in node.operator.input_slots() {
                let variable = node.inputs.get(slot).ok_or_else(|| IRError::MissingInput {
                    operator: node.name.clone(),
                    slot: slot.to_string(),
                })?;
                bound.insert(*slot, &self.variables[variable.index].variable);
            }
            debug!(
                "[{}] exec {} with inputs {}",
                node.name,
                node.kind(),
                bound
                    .iter()
                    .map(|(slot, v)| format!("{}: {}", slot, v))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            let mut ctx = ExecContext::new(node.id, &node.name, bound);
            node.operator.exec(&mut ctx)?;
            ctx.finish()
        };

        let mut produced = Vec::with_capacity(outcome.outputs.len());
        for (slot, variable) in outcome.outputs {
            debug!("[{}] output {}: {}", self.operators[index].name, slot, variable);
            let id = self.push_variable(variable, Some(operator));
            self.operators[index].outputs.insert(slot, id);
            produced.push(id);
        }
        let node = &mut self.operators[index];
        node.attributes = outcome.attributes;
        node.diagnostics = outcome.diagnostics;
        node.frozen = true;
        Ok(produced)
    }

    /// Add `operator`, bind every `(slot, variable)` pair and exec it. If any
    /// step fails the operator is removed again.
    pub fn apply<O>(
        &mut self,
        name: Option<&str>,
        operator: O,
        inputs: &[(&str, VariableId)],
    ) -> Result<Vec<VariableId>, IRError>
    where
        O: Operator + 'static,
    {
        let id = self.add_operator(name, operator);
        let outputs = self.bind_and_exec(id, inputs);
        if outputs.is_err() {
            // Still the last node, and a failed exec publishes no variables.
            self.operators.pop();
        }
        outputs
    }

    fn bind_and_exec(
        &mut self,
        operator: OperatorId,
        inputs: &[(&str, VariableId)],
    ) -> Result<Vec<VariableId>, IRError> {
        for (slot, variable) in inputs {
            self.append_input(operator, slot, *variable)?;
        }
        self.exec(operator)
    }

    /// Operators needed to compute the graph outputs, dependencies first.
    pub fn listup_operators(&self) -> Vec<OperatorId> {
        let mut visited = vec![false; self.operators.len()];
        let mut ordered = Vec::new();
        // (operator, whether its producers are already on the stack)
        let mut stack: Vec<(OperatorId, bool)> = self
            .outputs
            .iter()
            .rev()
            .filter_map(|v| self.variables[v.index].producer)
            .map(|operator| (operator, false))
            .collect();
        while let Some((operator, expanded)) = stack.pop() {
            if expanded {
                ordered.push(operator);
                continue;
            }
            if visited[operator.index] {
                continue;
            }
            visited[operator.index] = true;
            stack.push((operator, true));
            stack.extend(
                self.operators[operator.index]
                    .inputs
                    .values()
                    .rev()
                    .filter_map(|v| self.variables[v.index].producer)
                    .filter(|p| !visited[p.index])
                    .map(|p| (p, false)),
            );
        }
        ordered
    }

    fn push_variable(&mut self, variable: Variable, producer: Option<OperatorId>) -> VariableId {
        let id = VariableId {
            graph: self.id,
            index: self.variables.len(),
        };
        self.variables.push(VariableNode { variable, producer });
        id
    }

    fn check_variable(&self, variable: VariableId) -> Result<usize, IRError> {
        if variable.graph != self.id || variable.index >= self.variables.len() {
            return Err(IRError::UnknownVariable(variable.to_string()));
        }
        Ok(variable.index)
    }

    fn check_operator(&self, operator: OperatorId) -> Result<usize, IRError> {
        if operator.graph != self.id || operator.index >= self.operators.len() {
            return Err(IRError::UnknownOperator(operator.to_string()));
        }
        Ok(operator.index)
    }
}
