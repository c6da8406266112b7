//! CSV downloads of the suggestion tables kept in the session.

use csv::Writer;

use crate::dashboards::certification::CertificationSuggestion;
use crate::dashboards::siret::SiretSuggestion;
use crate::error::{MonitorError, Result};

pub const CERTIFICATION_EXPORT_FILE: &str = "suggestions.csv";
pub const SIRET_EXPORT_FILE: &str = "siret_suggestions.csv";

fn write_rows<I, R>(header: &[&str], rows: I) -> Result<String>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| MonitorError::Internal(format!("Failed to flush CSV: {e}")))?;
    String::from_utf8(bytes).map_err(|e| MonitorError::Internal(format!("Invalid CSV output: {e}")))
}

/// `name,created_at,url,emails` with emails joined by `; `.
pub fn certification_csv(suggestions: &[CertificationSuggestion]) -> Result<String> {
    write_rows(
        &["name", "created_at", "url", "emails"],
        suggestions.iter().map(|s| {
            [
                s.name.clone(),
                s.created_at.clone(),
                s.url.clone(),
                s.emails.join("; "),
            ]
        }),
    )
}

pub fn siret_csv(suggestions: &[SiretSuggestion]) -> Result<String> {
    write_rows(
        &["organization_id", "name", "matched_name", "score", "siren", "siret", "url"],
        suggestions.iter().map(|s| {
            [
                s.organization_id.clone(),
                s.name.clone(),
                s.matched_name.clone(),
                s.score.to_string(),
                s.siren.clone(),
                s.siret.clone(),
                s.url.clone(),
            ]
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certification_export_joins_emails() {
        let csv = certification_csv(&[CertificationSuggestion {
            row: 0,
            organization_id: "org-1".to_string(),
            name: "Mairie, de Test".to_string(),
            created_at: "2021-05-04".to_string(),
            url: "https://www.data.gouv.fr/fr/organizations/org-1/".to_string(),
            emails: vec!["a@test.fr".to_string(), "b@test.fr".to_string()],
            verified_domains: vec!["test.fr".to_string()],
            badges: vec![],
        }])
        .unwrap();

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("name,created_at,url,emails"));
        assert_eq!(
            lines.next(),
            Some("\"Mairie, de Test\",2021-05-04,https://www.data.gouv.fr/fr/organizations/org-1/,a@test.fr; b@test.fr")
        );
    }

    #[test]
    fn empty_export_has_header_only() {
        let csv = siret_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
