//! Emitter trait - the sole API boundary between workflow code and the catalog.
//! Workflow code depends on this crate, never on a concrete transport.

pub mod config;
pub mod file;
pub mod memory;
pub mod rest;

use async_trait::async_trait;
use catalog_types::{ChangeProposal, EmitError};

pub use config::EmitterConfig;
pub use file::FileEmitter;
pub use memory::InMemoryCatalog;
pub use rest::RestEmitter;

pub type Result<T> = std::result::Result<T, EmitError>;

#[async_trait]
pub trait Emitter: Send + Sync {
    /// Upsert one aspect for one entity.
    ///
    /// Keyed by `(urn, aspect name)`: a new aspect fully replaces the prior
    /// one of the same kind, and re-sending an identical proposal leaves the
    /// catalog unchanged. Implementations do not retry.
    async fn emit(&self, proposal: &ChangeProposal) -> Result<()>;

    /// Push anything buffered. Most sinks write through and need nothing.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Short human-readable destination, for logs.
    fn describe(&self) -> String;
}
