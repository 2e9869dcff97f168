//! Interprocedural resolution strategies.
//!
//! Exactly one strategy consumes the flow graph per run. ONESHOT and DEMAND
//! compute the same relation with different algorithmic shapes; NONE is a
//! deliberately incomplete syntactic baseline; FULL is declared but not
//! implemented and downgrades to DEMAND.

pub mod demand;
pub mod eager;

use crate::common::AnalysisError;
use crate::domain::callgraph::CallGraph;
use crate::domain::flowgraph::FlowGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// No interprocedural propagation; only function values syntactically
    /// observable at the call site resolve.
    None,
    /// Eager whole-program transitive closure (the default).
    Oneshot,
    /// Demand-driven backward reachability with cross-query memoization.
    Demand,
    /// Fully context-sensitive propagation; not implemented yet.
    Full,
}

impl Strategy {
    /// Parse a strategy name from the CLI. Unknown names are a
    /// configuration fault and abort before any analysis runs.
    pub fn parse(s: &str) -> Result<Strategy, AnalysisError> {
        match s.to_uppercase().as_str() {
            "NONE" => Ok(Strategy::None),
            "ONESHOT" => Ok(Strategy::Oneshot),
            "DEMAND" => Ok(Strategy::Demand),
            "FULL" => Ok(Strategy::Full),
            _ => Err(AnalysisError::UnknownStrategy(s.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::None => "NONE",
            Strategy::Oneshot => "ONESHOT",
            Strategy::Demand => "DEMAND",
            Strategy::Full => "FULL",
        }
    }
}

/// Resolve a flow graph into a call graph with the selected strategy.
pub fn resolve(fg: &FlowGraph, strategy: Strategy) -> CallGraph {
    match strategy {
        Strategy::None => eager::resolve(fg, false),
        Strategy::Oneshot => eager::resolve(fg, true),
        Strategy::Demand => demand::resolve(fg),
        Strategy::Full => {
            eprintln!("WARN: strategy FULL not implemented yet; using DEMAND instead");
            demand::resolve(fg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_strategies() {
        assert_eq!(Strategy::parse("NONE").unwrap(), Strategy::None);
        assert_eq!(Strategy::parse("oneshot").unwrap(), Strategy::Oneshot);
        assert_eq!(Strategy::parse("Demand").unwrap(), Strategy::Demand);
        assert_eq!(Strategy::parse("FULL").unwrap(), Strategy::Full);
    }

    #[test]
    fn test_parse_unknown_strategy_is_a_configuration_fault() {
        let err = Strategy::parse("EXHAUSTIVE").unwrap_err();
        assert!(err.to_string().contains("EXHAUSTIVE"));
    }
}
