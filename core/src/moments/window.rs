use crate::prelude::SurveyError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Half-open gate range `[start, end)` reduced into one moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct MomentWindow {
    pub start: u32,
    pub end: u32,
}

impl MomentWindow {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn gates(&self) -> Range<u32> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn file_name(&self) -> String {
        format!("moments_windows_{}-{}.xyz", self.start, self.end)
    }
}

impl From<(u32, u32)> for MomentWindow {
    fn from((start, end): (u32, u32)) -> Self {
        Self::new(start, end)
    }
}

impl From<MomentWindow> for (u32, u32) {
    fn from(window: MomentWindow) -> Self {
        (window.start, window.end)
    }
}

impl fmt::Display for MomentWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for MomentWindow {
    type Err = SurveyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || SurveyError::InvalidWindow(format!("{:?}, expected START-END", value));
        let (start, end) = value.split_once('-').ok_or_else(invalid)?;
        let start = start.trim().parse().map_err(|_| invalid())?;
        let end = end.trim().parse().map_err(|_| invalid())?;
        Ok(Self::new(start, end))
    }
}

/// Windows used for the East Rim survey processing.
pub fn default_windows() -> Vec<MomentWindow> {
    vec![
        MomentWindow::new(5, 15),
        MomentWindow::new(16, 25),
        MomentWindow::new(26, 35),
        MomentWindow::new(36, 45),
    ]
}

/// Gate index to gate width, as published in the survey report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GateWidths(BTreeMap<u32, f64>);

impl GateWidths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, gate: u32) -> Option<f64> {
        self.0.get(&gate).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gate widths for the East Rim VTEM survey, gates 4 through 46.
    pub fn east_rim() -> Self {
        const WIDTHS: [f64; 43] = [
            0.005, 0.005, 0.005, 0.005, 0.006, 0.007, 0.008, 0.009, 0.010, 0.012, 0.013, 0.015,
            0.018, 0.020, 0.023, 0.027, 0.030, 0.035, 0.040, 0.046, 0.053, 0.061, 0.070, 0.081,
            0.093, 0.107, 0.122, 0.141, 0.161, 0.185, 0.214, 0.245, 0.281, 0.323, 0.370, 0.427,
            0.490, 0.560, 0.646, 0.742, 0.852, 0.979, 1.125,
        ];
        WIDTHS
            .iter()
            .enumerate()
            .map(|(offset, &width)| (offset as u32 + 4, width))
            .collect()
    }
}

impl FromIterator<(u32, f64)> for GateWidths {
    fn from_iter<I: IntoIterator<Item = (u32, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_parses_and_names_its_file() {
        let window: MomentWindow = "5-15".parse().unwrap();
        assert_eq!(window, MomentWindow::new(5, 15));
        assert_eq!(window.file_name(), "moments_windows_5-15.xyz");
        assert_eq!(window.gates().count(), 10);
        assert!("5:15".parse::<MomentWindow>().is_err());
        assert!("a-15".parse::<MomentWindow>().is_err());
    }

    #[test]
    fn east_rim_table_covers_gates_4_to_46() {
        let widths = GateWidths::east_rim();
        assert_eq!(widths.len(), 43);
        assert_eq!(widths.get(4), Some(0.005));
        assert_eq!(widths.get(15), Some(0.015));
        assert_eq!(widths.get(46), Some(1.125));
        assert_eq!(widths.get(47), None);
    }

    #[test]
    fn default_windows_reference_known_gates() {
        let widths = GateWidths::east_rim();
        assert!(default_windows()
            .iter()
            .flat_map(MomentWindow::gates)
            .all(|gate| widths.get(gate).is_some()));
    }
}
