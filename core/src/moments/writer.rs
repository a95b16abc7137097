use crate::moments::calculator::OutputRecord;
use crate::moments::window::MomentWindow;
use crate::prelude::{SurveyError, SurveyResult};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const OUTPUT_HEADER: &str = "x,y,z,datum";

/// Shortest round-trip text for a float, keeping a trailing `.0` on
/// integral values so columns read back as floats.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

pub fn format_row(record: &OutputRecord) -> String {
    format!(
        "{},{},{},{}",
        format_value(record.x),
        format_value(record.y),
        format_value(record.z),
        format_value(record.moment)
    )
}

/// Per-window summary after the sinks are flushed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowOutput {
    pub window: MomentWindow,
    pub path: Option<PathBuf>,
    pub rows: usize,
}

struct WindowSink<W> {
    window: MomentWindow,
    path: Option<PathBuf>,
    writer: W,
    rows: usize,
}

/// One open output per moment window. Every sink is opened and given its
/// header before the first record is written; dropping the set closes them.
pub struct WindowSinks<W: Write> {
    sinks: Vec<WindowSink<W>>,
}

impl WindowSinks<BufWriter<File>> {
    /// Creates `moments_windows_<start>-<end>.xyz` for each window in `dir`.
    pub fn create<P: AsRef<Path>>(dir: P, windows: &[MomentWindow]) -> SurveyResult<Self> {
        let mut sinks = Vec::with_capacity(windows.len());
        for &window in windows {
            let path = dir.as_ref().join(window.file_name());
            let file = File::create(&path).map_err(|source| SurveyError::Create {
                path: path.clone(),
                source,
            })?;
            let mut sink = WindowSink {
                window,
                path: Some(path),
                writer: BufWriter::new(file),
                rows: 0,
            };
            writeln!(sink.writer, "{}", OUTPUT_HEADER)?;
            sinks.push(sink);
        }
        Ok(Self { sinks })
    }
}

impl<W: Write> WindowSinks<W> {
    pub fn from_writers(writers: Vec<(MomentWindow, W)>) -> SurveyResult<Self> {
        let mut sinks = Vec::with_capacity(writers.len());
        for (window, mut writer) in writers {
            writeln!(writer, "{}", OUTPUT_HEADER)?;
            sinks.push(WindowSink {
                window,
                path: None,
                writer,
                rows: 0,
            });
        }
        Ok(Self { sinks })
    }

    pub(crate) fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn write(&mut self, index: usize, record: &OutputRecord) -> SurveyResult<()> {
        let sink = self.sinks.get_mut(index).ok_or_else(|| {
            SurveyError::InvalidWindow(format!("no output sink at position {}", index))
        })?;
        writeln!(sink.writer, "{}", format_row(record))?;
        sink.rows += 1;
        Ok(())
    }

    /// Flushes every sink and reports what was written.
    pub fn finish(self) -> SurveyResult<Vec<WindowOutput>> {
        Ok(self
            .into_parts()?
            .into_iter()
            .map(|(output, _)| output)
            .collect())
    }

    /// Flushes every sink and hands the writers back.
    pub fn into_parts(self) -> SurveyResult<Vec<(WindowOutput, W)>> {
        let mut parts = Vec::with_capacity(self.sinks.len());
        for mut sink in self.sinks {
            sink.writer.flush()?;
            let output = WindowOutput {
                window: sink.window,
                path: sink.path,
                rows: sink.rows,
            };
            parts.push((output, sink.writer));
        }
        Ok(parts)
    }
}
