//! Prompt templates for the language model.

use super::types::LeadRequirement;

pub const REQUIREMENTS_SYSTEM_PROMPT: &str =
    "You turn free-text lead generation requests into structured search criteria. \
     Reply with a single JSON object and nothing else.";

/// Prompt asking the model to extract requirements from a user request.
pub fn requirements_prompt(user_request: &str) -> String {
    format!(
        r#"Lead generation request: "{request}"

Extract the following fields as a JSON object:
- industry: the kind of business wanted
- location: the geographic area to search
- required_fields: contact fields wanted, any of name, phone, email, website
- additional_criteria: other filters, or null
- max_results: number of leads wanted (50 if not stated)
- clarifying_questions: questions to ask when industry or location is unclear, otherwise []

Example:
{{"industry": "dentists", "location": "Toronto, Canada", "required_fields": ["name", "phone", "email", "website"], "additional_criteria": "accepting new patients", "max_results": 50, "clarifying_questions": []}}"#,
        request = user_request.replace('"', "'")
    )
}

/// Prompt asking the model for search queries, one per line.
pub fn queries_prompt(requirement: &LeadRequirement) -> String {
    format!(
        "Write 3 to 5 web search queries that find business listings with contact details.\n\
         Industry: {industry}\n\
         Location: {location}\n\
         Additional criteria: {criteria}\n\n\
         Reply with the queries only, one per line, without numbering.\n\n\
         Example:\n\
         dentists in Toronto contact information\n\
         dental offices Toronto phone email\n\
         Toronto dentistry practices directory",
        industry = requirement.industry,
        location = requirement.location,
        criteria = requirement.additional_criteria.as_deref().unwrap_or("none"),
    )
}

/// Split a model reply into queries, dropping list markers, quotes and blanks.
pub fn parse_queries(text: &str, max_queries: usize) -> Vec<String> {
    text.lines()
        .map(clean_query_line)
        .filter(|q| !q.is_empty() && !q.starts_with("```"))
        .take(max_queries)
        .map(String::from)
        .collect()
}

fn clean_query_line(line: &str) -> &str {
    let line = line.trim();
    let line = line.trim_start_matches(['-', '*', '•']).trim_start();

    // "1." / "2)" numbering
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    let line = if digits > 0 && line[digits..].starts_with(['.', ')']) {
        line[digits + 1..].trim_start()
    } else {
        line
    };

    line.trim_matches(['"', '\'', '`']).trim()
}
