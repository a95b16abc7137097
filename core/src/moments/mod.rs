pub mod calculator;
pub mod window;
pub mod writer;

pub use calculator::{gate_column, MomentCalculator, OutputRecord};
pub use window::{default_windows, GateWidths, MomentWindow};
pub use writer::{format_value, WindowOutput, WindowSinks};
