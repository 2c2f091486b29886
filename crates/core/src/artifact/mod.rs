//! Temporary CSV artifacts.
//!
//! Generated lead lists are stored once, served while unexpired and removed by
//! the [`ExpiryReaper`] after their TTL, whether or not anyone downloaded them.

mod fs_store;
mod reaper;
mod store;
mod types;

pub use fs_store::FsArtifactStore;
pub use reaper::{ExpiryReaper, ReapReport, ReaperStatus};
pub use store::ArtifactStore;
pub use types::*;
