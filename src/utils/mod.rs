//! Utility modules

pub mod deps;
pub mod logging;
pub mod paths;
