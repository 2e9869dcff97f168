// Domain model and analysis core for Mr. Magpie.

pub mod ast;
pub mod bindings;
pub mod callgraph;
pub mod flow_builder;
pub mod flowgraph;
pub mod strategy;
pub mod vertex;
