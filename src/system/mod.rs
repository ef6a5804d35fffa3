//! System-level plumbing shared by every run mode

pub mod logging;

pub use logging::init_logging;
