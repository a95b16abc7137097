pub mod model;
pub mod parser;
pub mod value;

pub use model::{Column, Survey, SurveyLine};
pub use parser::{LineKind, MarkerMode, ParsedSurvey, ParserState, SurveyBuilder, SurveyParser};
pub use value::Value;
