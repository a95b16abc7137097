use crate::geo::utm;
use crate::moments::window::{GateWidths, MomentWindow};
use crate::moments::writer::WindowSinks;
use crate::prelude::{SurveyError, SurveyResult};
use crate::survey::{Column, Survey, SurveyLine};
use crate::telemetry::LogManager;
use serde::Serialize;
use std::collections::HashSet;
use std::io::Write;

pub const LATITUDE_COLUMN: &str = "Latitude";
pub const LONGITUDE_COLUMN: &str = "Longitude";
pub const ELEVATION_COLUMN: &str = "DEM";

pub fn gate_column(gate: u32) -> String {
    format!("SFz[{}]", gate)
}

/// One output row: projected position, ground elevation and the moment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutputRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub moment: f64,
}

/// Window with its gates resolved to widths up front.
struct ResolvedWindow {
    window: MomentWindow,
    gates: Vec<(u32, f64)>,
}

/// Columns of one survey line needed to emit its records.
struct LineColumns<'a> {
    latitude: &'a Column,
    longitude: &'a Column,
    elevation: &'a Column,
    gates: Vec<Vec<(f64, &'a Column)>>,
}

/// Reduces gate windows into weighted sums per survey record.
pub struct MomentCalculator {
    windows: Vec<ResolvedWindow>,
    logger: LogManager,
}

impl MomentCalculator {
    /// Fails if any window gate has no width or a window is listed twice.
    pub fn new(widths: &GateWidths, windows: &[MomentWindow]) -> SurveyResult<Self> {
        let logger = LogManager::new("tdemcore::moments");
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(windows.len());

        for &window in windows {
            if !seen.insert(window) {
                return Err(SurveyError::DuplicateWindow(window));
            }
            if window.is_empty() {
                logger.warn(&format!("window {} covers no gates, moments will be 0", window));
            }
            let gates = window
                .gates()
                .map(|gate| {
                    widths
                        .get(gate)
                        .map(|width| (gate, width))
                        .ok_or(SurveyError::MissingGateWidth { gate })
                })
                .collect::<SurveyResult<Vec<_>>>()?;
            resolved.push(ResolvedWindow { window, gates });
        }

        Ok(Self {
            windows: resolved,
            logger,
        })
    }

    pub fn windows(&self) -> Vec<MomentWindow> {
        self.windows.iter().map(|resolved| resolved.window).collect()
    }

    /// Sum of the gate widths spanned by the window at `index`.
    pub fn window_width(&self, index: usize) -> f64 {
        self.windows
            .get(index)
            .map(|resolved| resolved.gates.iter().fold(0.0, |total, &(_, width)| total + width))
            .unwrap_or(0.0)
    }

    fn resolve<'a>(&self, line: &'a SurveyLine) -> SurveyResult<LineColumns<'a>> {
        let latitude = line.require_column(LATITUDE_COLUMN)?;
        let longitude = line.require_column(LONGITUDE_COLUMN)?;
        let elevation = line.require_column(ELEVATION_COLUMN)?;

        let gates = if latitude.is_empty() {
            Vec::new()
        } else {
            self.windows
                .iter()
                .map(|resolved| {
                    resolved
                        .gates
                        .iter()
                        .map(|&(gate, width)| {
                            line.require_column(&gate_column(gate)).map(|column| (width, column))
                        })
                        .collect::<SurveyResult<Vec<_>>>()
                })
                .collect::<SurveyResult<Vec<_>>>()?
        };

        Ok(LineColumns {
            latitude,
            longitude,
            elevation,
            gates,
        })
    }

    /// Visits every (window index, record) pair in line order, record order,
    /// then window order. The projection is computed once per record.
    pub fn for_each_record<F>(&self, survey: &Survey, mut visit: F) -> SurveyResult<()>
    where
        F: FnMut(usize, &OutputRecord) -> SurveyResult<()>,
    {
        for line in survey.lines() {
            let columns = self.resolve(line)?;
            let records = columns.latitude.len();
            self.logger.detail(&format!(
                "line {}: {} records",
                line.label(),
                records
            ));

            for record in 0..records {
                let latitude = line.numeric(columns.latitude, record)?;
                let longitude = line.numeric(columns.longitude, record)?;
                let projected = utm::from_latlon(latitude, longitude)?;
                let z = line.numeric(columns.elevation, record)?;

                for (index, gates) in columns.gates.iter().enumerate() {
                    let mut moment = 0.0;
                    for &(width, column) in gates {
                        moment += width * line.numeric(column, record)?;
                    }
                    let output = OutputRecord {
                        x: projected.easting,
                        y: projected.northing,
                        z,
                        moment,
                    };
                    visit(index, &output)?;
                }
            }
        }
        Ok(())
    }

    /// Collects the records for each window, in window order.
    pub fn compute(&self, survey: &Survey) -> SurveyResult<Vec<Vec<OutputRecord>>> {
        let mut outputs = vec![Vec::new(); self.windows.len()];
        self.for_each_record(survey, |index, record| {
            outputs[index].push(*record);
            Ok(())
        })?;
        Ok(outputs)
    }

    /// Streams every record into the matching window sink.
    pub fn write<W: Write>(&self, survey: &Survey, sinks: &mut WindowSinks<W>) -> SurveyResult<()> {
        if sinks.len() != self.windows.len() {
            return Err(SurveyError::InvalidWindow(format!(
                "{} output sinks for {} windows",
                sinks.len(),
                self.windows.len()
            )));
        }
        self.for_each_record(survey, |index, record| sinks.write(index, record))?;
        self.logger.record(&format!(
            "wrote {} records to {} windows",
            survey.total_records(),
            self.windows.len()
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::{MarkerMode, SurveyParser};
    use std::io::Cursor;

    fn survey(text: &str) -> Survey {
        SurveyParser::new(MarkerMode::Strict)
            .parse(Cursor::new(text))
            .unwrap()
            .survey
    }

    fn widths(pairs: &[(u32, f64)]) -> GateWidths {
        pairs.iter().copied().collect()
    }

    const TWO_GATES: &str = "/ Longitude Latitude DEM SFz[5] SFz[6]\n\
        Line 10\n\
        -105.0 40.0 1600.0 2.0 3.0\n\
        -105.01 40.01 1601.0 4.0 5.0\n";

    #[test]
    fn moment_is_the_exact_weighted_sum() {
        let calculator =
            MomentCalculator::new(&widths(&[(5, 0.005), (6, 0.006)]), &[MomentWindow::new(5, 7)])
                .unwrap();
        let outputs = calculator.compute(&survey(TWO_GATES)).unwrap();
        assert_eq!(outputs[0].len(), 2);
        assert_eq!(outputs[0][0].moment, 0.005 * 2.0 + 0.006 * 3.0);
        assert_eq!(outputs[0][1].moment, 0.005 * 4.0 + 0.006 * 5.0);
        assert_eq!(outputs[0][1].z, 1601.0);
    }

    #[test]
    fn single_gate_window_sums_one_gate() {
        let calculator =
            MomentCalculator::new(&widths(&[(5, 0.005), (6, 0.006)]), &[MomentWindow::new(6, 7)])
                .unwrap();
        let outputs = calculator.compute(&survey(TWO_GATES)).unwrap();
        assert_eq!(outputs[0][0].moment, 0.006 * 3.0);
    }

    #[test]
    fn projected_position_matches_utm() {
        let calculator =
            MomentCalculator::new(&widths(&[(5, 0.005)]), &[MomentWindow::new(5, 6)]).unwrap();
        let outputs = calculator.compute(&survey(TWO_GATES)).unwrap();
        let expected = utm::from_latlon(40.01, -105.01).unwrap();
        assert_eq!(outputs[0][1].x, expected.easting);
        assert_eq!(outputs[0][1].y, expected.northing);
    }

    #[test]
    fn missing_gate_width_aborts_before_any_work() {
        let result = MomentCalculator::new(&widths(&[(5, 0.005)]), &[MomentWindow::new(5, 7)]);
        assert!(matches!(
            result,
            Err(SurveyError::MissingGateWidth { gate: 6 })
        ));
    }

    #[test]
    fn missing_gate_column_is_fatal() {
        let calculator = MomentCalculator::new(
            &widths(&[(5, 0.005), (6, 0.006), (7, 0.007)]),
            &[MomentWindow::new(5, 8)],
        )
        .unwrap();
        let error = calculator.compute(&survey(TWO_GATES)).unwrap_err();
        assert!(matches!(error, SurveyError::MissingColumn { ref column, .. } if column == "SFz[7]"));
    }

    #[test]
    fn text_in_required_column_fails_fast() {
        let text = "/ Longitude Latitude DEM SFz[5]\nLine 10\n-105.0 40.0 * 2.0\n";
        let calculator =
            MomentCalculator::new(&widths(&[(5, 0.005)]), &[MomentWindow::new(5, 6)]).unwrap();
        assert!(matches!(
            calculator.compute(&survey(text)),
            Err(SurveyError::NonNumeric { ref column, .. }) if column == "DEM"
        ));
    }

    #[test]
    fn empty_line_without_gate_columns_is_accepted() {
        let text = "/ Longitude Latitude DEM\nLine 10\n";
        let calculator =
            MomentCalculator::new(&widths(&[(5, 0.005)]), &[MomentWindow::new(5, 6)]).unwrap();
        let outputs = calculator.compute(&survey(text)).unwrap();
        assert!(outputs[0].is_empty());
    }

    #[test]
    fn line_before_any_header_fails_on_latitude() {
        let text = "Line 1\n/ Longitude Latitude DEM\n";
        let calculator = MomentCalculator::new(&GateWidths::new(), &[]).unwrap();
        assert!(matches!(
            calculator.compute(&survey(text)),
            Err(SurveyError::MissingColumn { ref column, .. }) if column == LATITUDE_COLUMN
        ));
    }

    #[test]
    fn duplicate_windows_are_rejected() {
        let window = MomentWindow::new(5, 6);
        assert!(matches!(
            MomentCalculator::new(&widths(&[(5, 0.005)]), &[window, window]),
            Err(SurveyError::DuplicateWindow(_))
        ));
    }

    #[test]
    fn empty_window_yields_zero_moment_and_zero_width() {
        let calculator =
            MomentCalculator::new(&widths(&[(5, 0.005)]), &[MomentWindow::new(6, 6)]).unwrap();
        let outputs = calculator.compute(&survey(TWO_GATES)).unwrap();
        assert_eq!(outputs[0][0].moment, 0.0);
        assert_eq!(calculator.window_width(0), 0.0);
    }

    fn worked_example() -> String {
        let gates: Vec<u32> = (5..15).collect();
        let mut text = String::from("/ Longitude Latitude DEM");
        for gate in &gates {
            text.push_str(&format!(" {}", gate_column(*gate)));
        }
        text.push_str("\nLine 1010\n");
        for (lon, lat, dem, base) in [(-105.0, 40.0, 1600.0, 1.0), (-105.01, 40.01, 1601.0, 2.0)] {
            text.push_str(&format!("{} {} {}", lon, lat, dem));
            for gate in &gates {
                text.push_str(&format!(" {}", base * *gate as f64));
            }
            text.push('\n');
        }
        text
    }

    fn write_example(dir: &std::path::Path) -> Vec<u8> {
        let widths: GateWidths = (5..=15).map(|gate| (gate, gate as f64 / 1000.0)).collect();
        let window = MomentWindow::new(5, 15);
        let calculator = MomentCalculator::new(&widths, &[window]).unwrap();
        let mut sinks = WindowSinks::create(dir, &[window]).unwrap();
        calculator.write(&survey(&worked_example()), &mut sinks).unwrap();
        let outputs = sinks.finish().unwrap();
        assert_eq!(outputs[0].rows, 2);
        std::fs::read(dir.join("moments_windows_5-15.xyz")).unwrap()
    }

    #[test]
    fn worked_example_writes_projected_rows_with_weighted_sums() {
        let dir = tempfile::tempdir().unwrap();
        let text = String::from_utf8(write_example(dir.path())).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], "x,y,z,datum");

        for (row, (lat, lon, dem, base)) in rows[1..]
            .iter()
            .zip([(40.0, -105.0, 1600.0, 1.0), (40.01, -105.01, 1601.0, 2.0)])
        {
            let fields: Vec<f64> = row.split(',').map(|field| field.parse().unwrap()).collect();
            let expected = utm::from_latlon(lat, lon).unwrap();
            let moment = (5..15).fold(0.0, |total, gate| {
                total + (gate as f64 / 1000.0) * (base * gate as f64)
            });
            assert_eq!(fields, vec![expected.easting, expected.northing, dem, moment]);
        }
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        assert_eq!(write_example(first.path()), write_example(second.path()));
    }

    #[test]
    fn window_width_sums_gate_widths() {
        let calculator =
            MomentCalculator::new(&widths(&[(5, 0.5), (6, 0.25)]), &[MomentWindow::new(5, 7)])
                .unwrap();
        assert_eq!(calculator.window_width(0), 0.75);
        assert_eq!(calculator.windows(), vec![MomentWindow::new(5, 7)]);
    }

    #[test]
    fn sinks_must_line_up_with_windows() {
        let calculator =
            MomentCalculator::new(&widths(&[(5, 0.005)]), &[MomentWindow::new(5, 6)]).unwrap();
        let mut sinks = WindowSinks::from_writers(Vec::<(MomentWindow, Vec<u8>)>::new()).unwrap();
        assert!(matches!(
            calculator.write(&survey(TWO_GATES), &mut sinks),
            Err(SurveyError::InvalidWindow(_))
        ));
    }
}
