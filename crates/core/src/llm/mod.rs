//! Language model clients.

mod client;
mod gemini;

pub use client::*;
pub use gemini::GeminiClient;
