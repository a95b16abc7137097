use anyhow::Context;
use clap::Parser;
use generator::profile::{write_survey, GeneratorConfig};
use log::info;
use std::path::PathBuf;
use tdemcore::moments::MomentWindow;
use tdemcore::survey::MarkerMode;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod workflow;

fn parse_window(value: &str) -> Result<MomentWindow, String> {
    value.parse().map_err(|err: tdemcore::SurveyError| err.to_string())
}

fn parse_markers(value: &str) -> Result<MarkerMode, String> {
    value.parse().map_err(|err: tdemcore::SurveyError| err.to_string())
}

#[derive(Parser)]
#[command(author, version, about = "Gate-window moments for TDEM survey exports")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Survey export to process
    #[arg(long)]
    data: Option<PathBuf>,
    /// Directory receiving the moments_windows_<start>-<end>.xyz files
    #[arg(long)]
    output: Option<PathBuf>,
    /// Moment window START-END (end exclusive); repeat for several windows
    #[arg(long = "window", value_parser = parse_window)]
    windows: Vec<MomentWindow>,
    /// Marker recognition: strict (whole tokens) or legacy (substrings)
    #[arg(long, value_parser = parse_markers)]
    markers: Option<MarkerMode>,
    /// Write a JSON run summary
    #[arg(long)]
    summary: Option<PathBuf>,
    /// Write a synthetic survey export; it is processed when no data file is set
    #[arg(long)]
    synthesize: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = args.workflow.as_ref() {
        let mut loaded = WorkflowConfig::load(path)?;
        loaded.apply_args(args.data, args.output, args.windows, args.markers);
        loaded
    } else {
        WorkflowConfig::from_args(args.data, args.output, args.windows, args.markers)
    };

    if let Some(path) = args.synthesize {
        let generator = GeneratorConfig {
            seed: args.seed,
            ..Default::default()
        };
        write_survey(&generator, &path)?;
        info!("synthetic survey written to {}", path.display());
        if workflow_config.data_file_path.is_none() {
            workflow_config.data_file_path = Some(path);
        }
    }

    let runner = Runner::new(workflow_config);
    let result = runner.execute().context("running moments workflow")?;

    println!(
        "Moments run -> lines {}, records {}, rejected rows {}",
        result.lines, result.records, result.parse.rows_rejected
    );
    for window in &result.windows {
        println!(
            "  window {} -> {} rows (total width {:.3})",
            window.window, window.rows, window.total_width
        );
    }

    if let Some(path) = args.summary {
        result.write_summary(&path)?;
        info!(
            "run summary written to {} (output dir {})",
            path.display(),
            runner.config().output_path.display()
        );
    }

    Ok(())
}
