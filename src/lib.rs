//! Tensor-graph intermediate representation with axis-order algebra.
//!
//! Every [`Variable`](graph::variable::Variable) carries an
//! [`Order`](graph::order::Order) naming its physical dimensions. Operators
//! infer output shapes for any arrangement of their inputs and keep outputs
//! in the order of their primary input.

extern crate itertools;
extern crate thiserror;

use env_logger::Env;

pub mod graph;
pub mod operators;
pub mod prelude;
#[cfg(test)]
mod tests;

/// Configure logging from `RUST_LOG`, defaulting to warnings only.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("warn")).try_init();
}
