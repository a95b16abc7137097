use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tdemcore::moments::{default_windows, GateWidths, MomentWindow};
use tdemcore::survey::MarkerMode;

fn default_output_path() -> PathBuf {
    PathBuf::from("./")
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub data_file_path: Option<PathBuf>,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_windows")]
    pub moment_windows: Vec<MomentWindow>,
    #[serde(default = "GateWidths::east_rim")]
    pub times_width: GateWidths,
    #[serde(default)]
    pub marker_mode: MarkerMode,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            data_file_path: None,
            output_path: default_output_path(),
            moment_windows: default_windows(),
            times_width: GateWidths::east_rim(),
            marker_mode: MarkerMode::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        data_file_path: Option<PathBuf>,
        output_path: Option<PathBuf>,
        moment_windows: Vec<MomentWindow>,
        marker_mode: Option<MarkerMode>,
    ) -> Self {
        let mut config = Self::default();
        config.apply_args(data_file_path, output_path, moment_windows, marker_mode);
        config
    }

    /// Command-line values win over whatever the file set; an empty window
    /// list keeps the configured windows.
    pub fn apply_args(
        &mut self,
        data_file_path: Option<PathBuf>,
        output_path: Option<PathBuf>,
        moment_windows: Vec<MomentWindow>,
        marker_mode: Option<MarkerMode>,
    ) {
        if data_file_path.is_some() {
            self.data_file_path = data_file_path;
        }
        if let Some(output_path) = output_path {
            self.output_path = output_path;
        }
        if !moment_windows.is_empty() {
            self.moment_windows = moment_windows;
        }
        if let Some(marker_mode) = marker_mode {
            self.marker_mode = marker_mode;
        }
    }

    pub fn data_path(&self) -> anyhow::Result<&Path> {
        self.data_file_path
            .as_deref()
            .context("no survey file configured (set data_file_path or pass --data)")
    }
}
