use serde::{Deserialize, Serialize};

/// Upper bound on `max_results` accepted from callers.
pub const MAX_RESULTS_LIMIT: usize = 500;

/// Structured lead-generation criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRequirement {
    pub industry: String,
    pub location: String,
    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_criteria: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl LeadRequirement {
    pub fn new(industry: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            industry: industry.into(),
            location: location.into(),
            required_fields: default_required_fields(),
            additional_criteria: None,
            max_results: default_max_results(),
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.industry.trim().is_empty() {
            return Err("industry must not be empty".to_string());
        }
        if self.location.trim().is_empty() {
            return Err("location must not be empty".to_string());
        }
        if self.max_results == 0 || self.max_results > MAX_RESULTS_LIMIT {
            return Err(format!(
                "max_results must be between 1 and {}",
                MAX_RESULTS_LIMIT
            ));
        }
        Ok(())
    }
}

fn default_required_fields() -> Vec<String> {
    ["name", "phone", "email", "website"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_results() -> usize {
    50
}

/// Requirements as extracted by the language model; any field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequirementsDraft {
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub required_fields: Option<Vec<String>>,
    #[serde(default)]
    pub additional_criteria: Option<String>,
    #[serde(default)]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub clarifying_questions: Vec<String>,
}

impl RequirementsDraft {
    /// Complete requirements, or `None` while industry or location is missing.
    pub fn to_requirement(&self, default_max_results: usize) -> Option<LeadRequirement> {
        let industry = non_blank(self.industry.as_deref())?;
        let location = non_blank(self.location.as_deref())?;

        Some(LeadRequirement {
            industry: industry.to_string(),
            location: location.to_string(),
            required_fields: self
                .required_fields
                .clone()
                .filter(|f| !f.is_empty())
                .unwrap_or_else(default_required_fields),
            additional_criteria: non_blank(self.additional_criteria.as_deref()).map(String::from),
            max_results: self
                .max_results
                .unwrap_or(default_max_results)
                .clamp(1, MAX_RESULTS_LIMIT),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Where a lead was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Search,
    Places,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::Search => "search",
            LeadSource::Places => "places",
        }
    }
}

/// A discovered business contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub rating: Option<f64>,
    pub source: LeadSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_defaults_from_json() {
        let req: LeadRequirement =
            serde_json::from_str(r#"{"industry": "dentists", "location": "Toronto"}"#).unwrap();
        assert_eq!(req.max_results, 50);
        assert_eq!(req.required_fields, vec!["name", "phone", "email", "website"]);
        assert!(req.additional_criteria.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_requirement_validation() {
        assert!(LeadRequirement::new("", "Toronto").validate().is_err());
        assert!(LeadRequirement::new("dentists", " ").validate().is_err());
        assert!(LeadRequirement::new("dentists", "Toronto")
            .with_max_results(0)
            .validate()
            .is_err());
        assert!(LeadRequirement::new("dentists", "Toronto")
            .with_max_results(MAX_RESULTS_LIMIT + 1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_draft_incomplete_without_location() {
        let draft = RequirementsDraft {
            industry: Some("plumbers".to_string()),
            clarifying_questions: vec!["Which city?".to_string()],
            ..Default::default()
        };
        assert!(draft.to_requirement(50).is_none());
    }

    #[test]
    fn test_draft_to_requirement_fills_defaults() {
        let draft = RequirementsDraft {
            industry: Some("plumbers".to_string()),
            location: Some("Austin, TX".to_string()),
            additional_criteria: Some("  ".to_string()),
            max_results: Some(10_000),
            ..Default::default()
        };
        let req = draft.to_requirement(25).unwrap();
        assert_eq!(req.industry, "plumbers");
        assert_eq!(req.max_results, MAX_RESULTS_LIMIT);
        assert!(req.additional_criteria.is_none());
        assert_eq!(req.required_fields.len(), 4);

        let draft = RequirementsDraft {
            max_results: None,
            ..draft
        };
        assert_eq!(draft.to_requirement(25).unwrap().max_results, 25);
    }

    #[test]
    fn test_lead_source_serialization() {
        assert_eq!(
            serde_json::to_string(&LeadSource::Places).unwrap(),
            "\"places\""
        );
        assert_eq!(LeadSource::Search.as_str(), "search");
    }
}
