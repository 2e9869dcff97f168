// Command-line entry point for Mr. Magpie.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;

use mr_magpie::application::{AnalysisOptions, AnalyzeUsecase};
use mr_magpie::domain::strategy::Strategy;
use mr_magpie::infrastructure::{SourceLoader, TreeSitterParser};
use mr_magpie::ports::dot_exporter::DotExporter;
use mr_magpie::ports::json_exporter::JsonExporter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input JavaScript file(s)
    input: Vec<String>,

    /// Input source folder(s), scanned recursively for .js/.mjs/.cjs
    #[arg(short = 'd', long)]
    folder: Vec<String>,

    /// Print the flow graph as DOT
    #[arg(long)]
    fg: bool,

    /// Print the call graph
    #[arg(long)]
    cg: bool,

    /// Output the call graph as a JSON object
    #[arg(long)]
    json: bool,

    /// Print per-phase timings to stderr
    #[arg(long)]
    time: bool,

    /// Interprocedural propagation strategy: NONE, ONESHOT, DEMAND or FULL
    #[arg(short, long, default_value = "ONESHOT")]
    strategy: String,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configuration faults abort before any analysis runs.
    let strategy = Strategy::parse(&cli.strategy)?;
    if cli.json && !cli.cg {
        eprintln!("WARN: ignoring --json, since --cg was not specified");
    }

    let mut sources = Vec::new();
    for input in &cli.input {
        sources.push(SourceLoader::load_file(input)?);
    }
    for folder in &cli.folder {
        sources.extend(SourceLoader::collect_js_files(folder));
    }
    if sources.is_empty() {
        bail!("no input files; provide FILES or --folder <dir>");
    }

    let usecase = AnalyzeUsecase {
        parser: &TreeSitterParser,
    };
    let options = AnalysisOptions {
        strategy,
        time: cli.time,
    };
    let analysis = usecase.run(&sources, &options)?;

    let mut report = String::new();
    if cli.fg {
        report.push_str(&DotExporter::to_dot(&analysis.flow_graph, &analysis.program));
        report.push('\n');
    }
    if cli.cg {
        if cli.json {
            let json = JsonExporter::to_pretty_string(&analysis.call_graph, &analysis.program)
                .context("Failed to serialize the call graph")?;
            report.push_str(&json);
            report.push('\n');
        } else {
            analysis.call_graph.for_each_edge(|call, target| {
                report.push_str(&format!(
                    "{} -> {}\n",
                    call.target_label(&analysis.program),
                    target.target_label(&analysis.program)
                ));
            });
        }
    }

    match &cli.output {
        Some(path) => fs::write(path, report)
            .with_context(|| format!("Failed to write output file {}", path))?,
        None => print!("{}", report),
    }
    Ok(())
}
