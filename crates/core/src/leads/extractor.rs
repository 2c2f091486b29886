//! Contact extraction from search results.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::{Lead, LeadSource};
use crate::search::{OrganicResult, PlaceResult};

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap()
});

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

const TITLE_SUFFIX: &str = " - Google Search";

/// First phone number in `text`.
pub fn extract_phone(text: &str) -> Option<String> {
    PHONE_RE.find(text).map(|m| m.as_str().trim().to_string())
}

/// First email address in `text`.
pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

/// Digits-only form used to compare phone numbers; a leading North American
/// country code is dropped.
pub fn normalize_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    match digits.strip_prefix('1') {
        Some(rest) if digits.len() == 11 => rest.to_string(),
        _ => digits,
    }
}

/// Build leads from one batch of organic and places results.
///
/// Organic results only count when their snippet carries a phone number.
/// Places count when they list a phone. Duplicate phones within the batch are dropped.
pub fn extract_leads(organic: &[OrganicResult], places: &[PlaceResult]) -> Vec<Lead> {
    let mut seen = HashSet::new();
    let mut leads = Vec::new();

    for result in organic {
        let Some(phone) = extract_phone(&result.snippet) else {
            continue;
        };
        if !seen.insert(normalize_phone(&phone)) {
            continue;
        }
        leads.push(Lead {
            name: result
                .title
                .strip_suffix(TITLE_SUFFIX)
                .unwrap_or(&result.title)
                .to_string(),
            phone,
            email: extract_email(&result.snippet).unwrap_or_default(),
            website: result.link.clone(),
            address: String::new(),
            rating: None,
            source: LeadSource::Search,
        });
    }

    for place in places {
        let Some(phone) = place
            .phone_number
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
        else {
            continue;
        };
        if !seen.insert(normalize_phone(phone)) {
            continue;
        }
        leads.push(Lead {
            name: place.title.clone(),
            phone: phone.to_string(),
            email: String::new(),
            website: place.website.clone().unwrap_or_default(),
            address: place.address.clone().unwrap_or_default(),
            rating: place.rating,
            source: LeadSource::Places,
        });
    }

    leads
}

/// Deduplicate by normalized phone, keeping first occurrences, capped at `max_results`.
pub fn merge_leads(leads: impl IntoIterator<Item = Lead>, max_results: usize) -> Vec<Lead> {
    let mut seen = HashSet::new();
    leads
        .into_iter()
        .filter(|lead| {
            let key = normalize_phone(&lead.phone);
            !key.is_empty() && seen.insert(key)
        })
        .take(max_results)
        .collect()
}
