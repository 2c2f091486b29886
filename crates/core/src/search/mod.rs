//! Web and places search.

mod serper;
mod types;

pub use serper::SerperClient;
pub use types::*;
