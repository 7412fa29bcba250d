//! Library side of the `gradebook` command line.

pub mod config;
pub mod logging;
pub mod selector;
