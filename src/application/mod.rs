//! Analysis pipeline orchestration.
//!
//! Parse (parallel, per file) → bind → build flow graph → resolve with
//! exactly one strategy. Everything after parsing is single-threaded and
//! synchronous; the run either completes or fails whole.

use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::common::AnalysisError;
use crate::domain::ast::BoundProgram;
use crate::domain::callgraph::CallGraph;
use crate::domain::flow_builder::build_flow_graph;
use crate::domain::flowgraph::FlowGraph;
use crate::domain::strategy::{self, Strategy};
use crate::domain::bindings;
use crate::ports::SourceParser;

/// Immutable per-run configuration, threaded through the pipeline instead
/// of living in ambient globals.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    pub strategy: Strategy,
    /// Print per-phase timings to stderr.
    pub time: bool,
}

/// Everything one run produces.
pub struct Analysis {
    pub program: BoundProgram,
    pub flow_graph: FlowGraph,
    pub call_graph: CallGraph,
    pub timings: Vec<(&'static str, Duration)>,
}

pub struct AnalyzeUsecase<'a> {
    pub parser: &'a dyn SourceParser,
}

impl<'a> AnalyzeUsecase<'a> {
    pub fn run(
        &self,
        sources: &[(String, String)],
        options: &AnalysisOptions,
    ) -> Result<Analysis, AnalysisError> {
        let mut timings = Vec::new();

        let start = Instant::now();
        let modules = sources
            .par_iter()
            .map(|(file, source)| self.parser.parse(file, source))
            .collect::<Result<Vec<_>, _>>()?;
        Self::record(&mut timings, "parsing", start.elapsed(), options);

        let start = Instant::now();
        let program = bindings::bind(modules);
        Self::record(&mut timings, "bindings", start.elapsed(), options);

        let start = Instant::now();
        let flow_graph = build_flow_graph(&program)?;
        let call_graph = strategy::resolve(&flow_graph, options.strategy);
        Self::record(&mut timings, "callgraph", start.elapsed(), options);

        Ok(Analysis {
            program,
            flow_graph,
            call_graph,
            timings,
        })
    }

    fn record(
        timings: &mut Vec<(&'static str, Duration)>,
        phase: &'static str,
        elapsed: Duration,
        options: &AnalysisOptions,
    ) {
        if options.time {
            eprintln!("{:<9} {} ms", phase, elapsed.as_millis());
        }
        timings.push((phase, elapsed));
    }
}
