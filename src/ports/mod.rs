use crate::common::AnalysisError;
use crate::domain::ast::Module;

pub mod dot_exporter;
pub mod json_exporter;

/// Parses one source file into a normalized module. `Sync` so files can be
/// parsed in parallel before the single-threaded analysis begins.
pub trait SourceParser: Sync {
    fn parse(&self, file: &str, source: &str) -> Result<Module, AnalysisError>;
}
