//! CLI commands implementation.

mod classify;
mod extract;
mod labels;

pub use classify::{cmd_llm, cmd_zero_shot};
pub use extract::cmd_extract;
pub use labels::cmd_labels;
