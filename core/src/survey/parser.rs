use crate::prelude::{SurveyError, SurveyResult};
use crate::survey::model::Survey;
use crate::telemetry::{LogManager, ParseMetrics};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

const HEADER_MARKER: &str = "Longitude";
const LINE_MARKER: &str = "Line";
const TIE_MARKER: &str = "Tie";
const COMMENT_MARKER: &str = "/";

/// How block markers are recognized in the input.
///
/// `Legacy` matches marker words anywhere in the line as substrings, so a
/// data token or comment that happens to contain `Line`, `Tie` or `/` is
/// misread. It exists to reproduce outputs of the older tool. `Strict`
/// only accepts whole tokens in marker position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerMode {
    #[default]
    Strict,
    Legacy,
}

impl FromStr for MarkerMode {
    type Err = SurveyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "strict" => Ok(MarkerMode::Strict),
            "legacy" => Ok(MarkerMode::Legacy),
            _ => Err(SurveyError::InvalidMarkerMode(value.to_string())),
        }
    }
}

impl fmt::Display for MarkerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerMode::Strict => f.write_str("strict"),
            MarkerMode::Legacy => f.write_str("legacy"),
        }
    }
}

/// Classification of one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Header(Vec<&'a str>),
    BlockStart(&'a str),
    BlockEnd,
    Comment,
    Data(Vec<&'a str>),
}

impl MarkerMode {
    pub fn classify<'a>(&self, line: &'a str) -> LineKind<'a> {
        let tokens: Vec<&'a str> = line.split_whitespace().collect();
        let Some(&first) = tokens.first() else {
            return LineKind::Blank;
        };
        let last = tokens[tokens.len() - 1];

        match self {
            MarkerMode::Strict => {
                if tokens.contains(&HEADER_MARKER) {
                    LineKind::Header(tokens[1..].to_vec())
                } else if first == LINE_MARKER && tokens.len() > 1 {
                    LineKind::BlockStart(last)
                } else if first == TIE_MARKER {
                    LineKind::BlockEnd
                } else if first.starts_with(COMMENT_MARKER) || first == LINE_MARKER {
                    LineKind::Comment
                } else {
                    LineKind::Data(tokens)
                }
            }
            MarkerMode::Legacy => {
                if line.contains(HEADER_MARKER) {
                    LineKind::Header(tokens[1..].to_vec())
                } else if line.contains(LINE_MARKER) {
                    LineKind::BlockStart(last)
                } else if line.contains(TIE_MARKER) {
                    LineKind::BlockEnd
                } else if line.contains(COMMENT_MARKER) {
                    LineKind::Comment
                } else {
                    LineKind::Data(tokens)
                }
            }
        }
    }
}

/// Whether data rows currently belong to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Idle,
    InBlock(usize),
}

/// Accumulates the survey while the parse loop feeds it classified lines.
pub struct SurveyBuilder {
    headers: Vec<String>,
    state: ParserState,
    survey: Survey,
    metrics: ParseMetrics,
    logger: LogManager,
}

impl SurveyBuilder {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
            state: ParserState::Idle,
            survey: Survey::new(),
            metrics: ParseMetrics::new(),
            logger: LogManager::new("tdemcore::parser"),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Applies one classified line. `line_number` is 1-based and only used
    /// for diagnostics.
    pub fn apply(&mut self, line_number: usize, kind: LineKind<'_>) {
        match kind {
            LineKind::Blank => {}
            LineKind::Comment => self.metrics.record_comment(),
            LineKind::Header(names) => {
                self.headers = names.iter().map(|name| name.to_string()).collect();
                self.metrics.record_header();
                self.logger.detail(&format!(
                    "line {}: header with {} columns",
                    line_number,
                    self.headers.len()
                ));
            }
            LineKind::BlockStart(label) => {
                let (position, duplicate) = self.survey.start_line(label, &self.headers);
                if duplicate {
                    self.logger.warn(&format!(
                        "line {}: block {} seen again, earlier records discarded",
                        line_number, label
                    ));
                }
                self.metrics.record_block(duplicate);
                self.state = ParserState::InBlock(position);
            }
            LineKind::BlockEnd => {
                self.metrics.record_tie();
                self.state = ParserState::Idle;
            }
            LineKind::Data(tokens) => self.push_data(line_number, &tokens),
        }
    }

    fn push_data(&mut self, line_number: usize, tokens: &[&str]) {
        let ParserState::InBlock(position) = self.state else {
            self.metrics.record_outside_block();
            return;
        };
        let Some(line) = self.survey.line_mut(position) else {
            return;
        };
        if line.columns().is_empty() {
            self.logger.detail(&format!(
                "line {}: block {} has no columns, row not stored",
                line_number,
                line.label()
            ));
            self.metrics.record_outside_block();
            return;
        }
        match line.push_row(tokens) {
            Ok(()) => self.metrics.record_accepted(),
            Err(missing) => {
                self.logger.warn(&format!(
                    "line {}: row in block {} is {} token(s) short, skipped",
                    line_number,
                    line.label(),
                    missing
                ));
                self.metrics.record_rejected();
            }
        }
    }

    pub fn finish(self) -> ParsedSurvey {
        ParsedSurvey {
            survey: self.survey,
            metrics: self.metrics,
        }
    }
}

impl Default for SurveyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a parse pass.
#[derive(Debug, Clone)]
pub struct ParsedSurvey {
    pub survey: Survey,
    pub metrics: ParseMetrics,
}

/// Single-pass reader for block-structured survey exports.
pub struct SurveyParser {
    mode: MarkerMode,
    logger: LogManager,
}

impl SurveyParser {
    pub fn new(mode: MarkerMode) -> Self {
        Self {
            mode,
            logger: LogManager::new("tdemcore::parser"),
        }
    }

    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> SurveyResult<ParsedSurvey> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref).map_err(|source| SurveyError::Open {
            path: path_ref.to_path_buf(),
            source,
        })?;
        self.logger
            .record(&format!("parsing {} ({} markers)", path_ref.display(), self.mode));
        self.parse(BufReader::new(file))
    }

    /// Parses a whole stream. Lines are decoded lossily so exports with
    /// stray non-UTF-8 bytes still parse.
    pub fn parse<R: BufRead>(&self, mut reader: R) -> SurveyResult<ParsedSurvey> {
        let mut builder = SurveyBuilder::new();
        let mut buffer = Vec::new();
        let mut line_number = 0;

        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            line_number += 1;
            let text = String::from_utf8_lossy(&buffer);
            builder.apply(line_number, self.mode.classify(&text));
        }

        let parsed = builder.finish();
        self.logger.record(&format!(
            "parsed {} lines: {}",
            line_number,
            parsed.metrics.summary()
        ));
        Ok(parsed)
    }
}

impl Default for SurveyParser {
    fn default() -> Self {
        Self::new(MarkerMode::default())
    }
}
