//! Component assembly.
//!
//! # Data Flow
//! ```text
//! AppConfig
//!     → assembly.rs (validate, build each component in order)
//!         reporters → collector → engine → endpoints/route table
//!         → error-name check → protected set → security gate
//!         → registry hooks → server-config gauges
//!     → ServerConfigSnapshot (immutable, shared by every request)
//! ```
//!
//! # Design Decisions
//! - Optional features are `Capability<T>`: `Disabled` is a final answer
//! - Assembly fails fast on the first broken step, naming it
//! - Lazily created shared resources use [`OnceResource`]

pub mod assembly;
pub mod capability;
pub mod once;
pub mod registry;

pub use assembly::{AssemblyError, ComponentAssembly, ServerConfigSnapshot};
pub use capability::Capability;
pub use once::OnceResource;
pub use registry::ComponentRegistry;
