pub mod model;
pub mod state;

pub use model::{truncate_chars, AnalysisOutcome, ManualVerdict, ReviewState, Task};
pub use state::TaskStatus;
