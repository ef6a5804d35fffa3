//! Application lifecycle: startup wiring, the HTTP server and shutdown

pub mod server;
pub mod shutdown;
pub mod startup;

pub use server::run_server;
