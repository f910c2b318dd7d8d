//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Assemble snapshot → Bind listener → on_startup hooks → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain → on_shutdown hooks → Stop metrics
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::launch;
