//! Core parsing and reduction for time-domain EM survey exports.
//!
//! The modules split the legacy moments script into a block parser that
//! rebuilds line/column tables, a UTM projection, and a calculator that
//! reduces gate windows into weighted sums written one file per window.

pub mod geo;
pub mod moments;
pub mod prelude;
pub mod survey;
pub mod telemetry;

pub use prelude::{SurveyError, SurveyResult};
