//! CSV rendering of leads.

use super::types::Lead;

/// Column order of generated files.
pub const CSV_FIELDS: [&str; 7] = [
    "name", "phone", "email", "website", "address", "rating", "source",
];

/// Render leads as UTF-8 CSV with a header row and CRLF line endings.
pub fn leads_to_csv(leads: &[Lead]) -> Vec<u8> {
    let mut out = String::new();
    write_row(&mut out, CSV_FIELDS.iter().copied());

    for lead in leads {
        let rating = lead.rating.map(|r| r.to_string()).unwrap_or_default();
        write_row(
            &mut out,
            [
                lead.name.as_str(),
                lead.phone.as_str(),
                lead.email.as_str(),
                lead.website.as_str(),
                lead.address.as_str(),
                rating.as_str(),
                lead.source.as_str(),
            ],
        );
    }

    out.into_bytes()
}

fn write_row<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_field(out, field);
    }
    out.push_str("\r\n");
}

fn write_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::LeadSource;

    fn lead(name: &str) -> Lead {
        Lead {
            name: name.to_string(),
            phone: "512-555-0100".to_string(),
            email: String::new(),
            website: "https://example.com".to_string(),
            address: "1 Main St, Austin, TX".to_string(),
            rating: Some(4.5),
            source: LeadSource::Places,
        }
    }

    #[test]
    fn test_header_only_for_no_leads() {
        let csv = leads_to_csv(&[]);
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "name,phone,email,website,address,rating,source\r\n"
        );
    }

    #[test]
    fn test_quotes_fields_with_commas_and_quotes() {
        let csv = String::from_utf8(leads_to_csv(&[lead("Joe's \"Best\" Plumbing")])).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "\"Joe's \"\"Best\"\" Plumbing\",512-555-0100,,https://example.com,\"1 Main St, Austin, TX\",4.5,places"
        );
    }

    #[test]
    fn test_embedded_newline_is_quoted() {
        let mut l = lead("Two\nLines");
        l.rating = None;
        l.address.clear();
        let csv = String::from_utf8(leads_to_csv(&[l])).unwrap();
        assert!(csv.contains("\"Two\nLines\",512-555-0100,,https://example.com,,,places\r\n"));
    }

    #[test]
    fn test_utf8_preserved() {
        let csv = leads_to_csv(&[lead("Café Zoë")]);
        assert!(String::from_utf8(csv).unwrap().contains("Café Zoë"));
    }
}
