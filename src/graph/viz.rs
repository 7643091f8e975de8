use std::{collections::BTreeMap, fmt};

use itertools::Itertools;

use super::{operator::OperatorNode, Graph, VariableId};

impl Graph {
    fn write_operator(&self, node: &OperatorNode, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = |slots: &BTreeMap<&'static str, VariableId>| {
            slots
                .iter()
                .map(|(slot, id)| match self.variable(*id) {
                    Ok(variable) => format!("{}={}{}", slot, id, variable),
                    Err(_) => format!("{}={}", slot, id),
                })
                .join(", ")
        };
        write!(
            f,
            "{:<6} {}({}) -> ({})",
            node.id().to_string(),
            node.name(),
            bindings(node.inputs()),
            bindings(node.outputs()),
        )?;
        if !node.attributes().is_empty() {
            write!(f, " {{{}}}", node.attributes().iter().join(", "))?;
        }
        writeln!(f)
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let describe = |ids: &[VariableId]| {
            ids.iter()
                .filter_map(|id| self.variable(*id).ok().map(|v| format!("{}{}", id, v)))
                .join(", ")
        };
        writeln!(f, "inputs: {}", describe(self.inputs()))?;
        for node in self.operators() {
            self.write_operator(node, f)?;
        }
        writeln!(f, "outputs: {}", describe(self.outputs()))
    }
}
