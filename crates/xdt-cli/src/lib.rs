//! CLI library components for XDT configuration transforms.

pub mod logging;
pub mod report;
pub mod types;
