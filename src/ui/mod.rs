//! Terminal UI: interactive prompts and result output

pub mod output;
pub mod prompt;
