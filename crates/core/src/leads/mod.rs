//! Lead requirements, extraction from search results, and CSV rendering.

mod csv;
mod extractor;
mod prompts;
mod types;

pub use csv::{leads_to_csv, CSV_FIELDS};
pub use extractor::{extract_email, extract_leads, extract_phone, merge_leads, normalize_phone};
pub use prompts::{parse_queries, queries_prompt, requirements_prompt, REQUIREMENTS_SYSTEM_PROMPT};
pub use types::*;
