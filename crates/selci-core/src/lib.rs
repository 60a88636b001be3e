//! selci-core - Selective CI domain model
//!
//! Provides the building blocks for a component-gated CI pipeline:
//! - Workflow definitions loaded from `selci.toml`
//! - A change gate deciding whether a component's tests must run
//! - Content-derived cache keys for dependency installs

pub mod cachekey;
pub mod error;
pub mod fakes;
pub mod gate;
pub mod obs;
pub mod telemetry;
pub mod vcs;
pub mod workflow;

// Re-export key types
pub use cachekey::{CacheKey, CacheStore};
pub use error::{Result, SelciError};
pub use gate::{ChangeGate, ChangeVerdict};
pub use telemetry::init_tracing;
pub use vcs::{GitCli, Vcs};
pub use workflow::{ComponentConfig, WorkflowConfig};
