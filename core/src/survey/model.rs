use crate::prelude::{SurveyError, SurveyResult};
use crate::survey::value::Value;
use serde::Serialize;
use std::collections::HashMap;

/// Named column of a survey line, one value per accepted record row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One flight line: the columns declared by the header in force when the
/// `Line` marker was read, filled row by row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyLine {
    label: String,
    columns: Vec<Column>,
}

impl SurveyLine {
    pub fn new(label: impl Into<String>, headers: &[String]) -> Self {
        Self {
            label: label.into(),
            columns: headers.iter().map(Column::new).collect(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// First column with the given name. Duplicate header names resolve to
    /// their leftmost position.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn require_column(&self, name: &str) -> SurveyResult<&Column> {
        self.column(name).ok_or_else(|| SurveyError::MissingColumn {
            line: self.label.clone(),
            column: name.to_string(),
        })
    }

    /// Reads a numeric cell, failing on missing records and on text values.
    pub fn numeric(&self, column: &Column, record: usize) -> SurveyResult<f64> {
        match column.values.get(record) {
            Some(Value::Number(number)) => Ok(*number),
            Some(Value::Text(raw)) => Err(SurveyError::NonNumeric {
                line: self.label.clone(),
                column: column.name.clone(),
                record,
                raw: raw.clone(),
            }),
            None => Err(SurveyError::MissingValue {
                line: self.label.clone(),
                column: column.name.clone(),
                record,
            }),
        }
    }

    /// Number of records, taken from the first column.
    pub fn record_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// Appends one row. Rows with fewer tokens than columns are refused whole
    /// and the shortfall is returned; extra trailing tokens are ignored.
    pub fn push_row(&mut self, tokens: &[&str]) -> Result<(), usize> {
        if tokens.len() < self.columns.len() {
            return Err(self.columns.len() - tokens.len());
        }
        for (column, token) in self.columns.iter_mut().zip(tokens) {
            column.values.push(Value::parse(token));
        }
        Ok(())
    }

    fn reset(&mut self, headers: &[String]) {
        self.columns = headers.iter().map(Column::new).collect();
    }
}

/// All flight lines of a survey file in first-seen order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Survey {
    lines: Vec<SurveyLine>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Survey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[SurveyLine] {
        &self.lines
    }

    pub fn line(&self, label: &str) -> Option<&SurveyLine> {
        self.index.get(label).map(|&position| &self.lines[position])
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_records(&self) -> usize {
        self.lines.iter().map(SurveyLine::record_count).sum()
    }

    /// Starts (or restarts) the block for `label` and returns its position.
    /// A label seen before is emptied in place and keeps its original
    /// position; the flag reports whether that happened.
    pub fn start_line(&mut self, label: &str, headers: &[String]) -> (usize, bool) {
        if let Some(&position) = self.index.get(label) {
            self.lines[position].reset(headers);
            return (position, true);
        }
        let position = self.lines.len();
        self.lines.push(SurveyLine::new(label, headers));
        self.index.insert(label.to_string(), position);
        (position, false)
    }

    pub fn line_mut(&mut self, position: usize) -> Option<&mut SurveyLine> {
        self.lines.get_mut(position)
    }
}
