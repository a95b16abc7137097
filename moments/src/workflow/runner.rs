use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tdemcore::moments::{MomentCalculator, MomentWindow, WindowSinks};
use tdemcore::survey::{MarkerMode, SurveyParser};
use tdemcore::telemetry::ParseMetrics;

#[derive(Debug, Clone, Serialize)]
pub struct WindowSummary {
    pub window: MomentWindow,
    pub file: Option<PathBuf>,
    pub rows: usize,
    pub total_width: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub data_file: PathBuf,
    pub marker_mode: MarkerMode,
    pub lines: usize,
    pub records: usize,
    pub parse: ParseMetrics,
    pub windows: Vec<WindowSummary>,
}

impl WorkflowResult {
    pub fn write_summary<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path_ref = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("serializing run summary")?;
        fs::write(path_ref, json)
            .with_context(|| format!("writing run summary {}", path_ref.display()))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Parses the whole survey, then writes one file per moment window.
    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let data_file = self.config.data_path()?;

        let parsed = SurveyParser::new(self.config.marker_mode)
            .parse_file(data_file)
            .with_context(|| format!("parsing survey {}", data_file.display()))?;
        info!(
            "{} lines, {} records ({})",
            parsed.survey.len(),
            parsed.survey.total_records(),
            parsed.metrics.summary()
        );

        let calculator =
            MomentCalculator::new(&self.config.times_width, &self.config.moment_windows)
                .context("configuring moment windows")?;

        let mut sinks = WindowSinks::create(&self.config.output_path, &calculator.windows())
            .with_context(|| {
                format!(
                    "opening moment outputs in {}",
                    self.config.output_path.display()
                )
            })?;
        calculator
            .write(&parsed.survey, &mut sinks)
            .context("computing moments")?;
        let outputs = sinks.finish().context("flushing moment outputs")?;

        let windows = outputs
            .into_iter()
            .enumerate()
            .map(|(index, output)| WindowSummary {
                window: output.window,
                file: output.path,
                rows: output.rows,
                total_width: calculator.window_width(index),
            })
            .collect();

        Ok(WorkflowResult {
            data_file: data_file.to_path_buf(),
            marker_mode: self.config.marker_mode,
            lines: parsed.survey.len(),
            records: parsed.survey.total_records(),
            parse: parsed.metrics,
            windows,
        })
    }
}
