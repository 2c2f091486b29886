//! Lead generation jobs: discuss, build and create.

mod generator;
mod store;
mod types;

pub use generator::{GeneratorConfig, LeadGenerator};
pub use store::JobStore;
pub use types::*;
