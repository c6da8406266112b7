//! Certification of public-service organizations.
//!
//! A daily job drops, under a dated folder, the organizations already
//! certified (`certified.json`), those identified as public services or
//! local authorities (`SP_or_CT.json`) and the SIRETs it could not process
//! (`issues.json`). The report charts both counts per month and suggests
//! organizations to certify from the latest folder.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::charts::{Axis, Chart, Trace};
use crate::clients::{CatalogClient, SourcesClient, StorageClient};
use crate::error::{MonitorError, Result};
use crate::snapshots::latest_day_of_each_month;

pub const CERTIFIED_BADGE: &str = "certified";
pub const PUBLIC_SERVICE_BADGE: &str = "public-service";

const ORGANIZATION_FIELDS: &str = "name,created_at,badges,members{user{uri}},business_number_id";

/// Organization ids listed in one dated folder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthLists {
    pub certified: Vec<String>,
    pub sp_or_ct: Vec<String>,
}

impl MonthLists {
    /// Public services and local authorities not certified yet.
    pub fn pending(&self) -> Vec<String> {
        let certified: HashSet<&str> = self.certified.iter().map(String::as_str).collect();
        self.sp_or_ct
            .iter()
            .filter(|o| !certified.contains(o.as_str()))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificationSuggestion {
    /// Position in the displayed list, echoed back by actions.
    pub row: usize,
    pub organization_id: String,
    pub name: String,
    /// `YYYY-MM-DD`
    pub created_at: String,
    pub url: String,
    pub emails: Vec<String>,
    /// Registered email domains of the organization's SIRET used by at least
    /// one member.
    pub verified_domains: Vec<String>,
    pub badges: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificationIssue {
    pub organization_id: String,
    pub name: String,
    pub url: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificationReport {
    pub chart: Chart,
    pub suggestions: Vec<CertificationSuggestion>,
    pub issues: Vec<CertificationIssue>,
}

/// Grouped bars of certified organizations and pending public services.
pub fn chart(history: &BTreeMap<String, MonthLists>) -> Chart {
    let certified = Trace::bar("Orgas certifiées").with_points(
        history
            .iter()
            .map(|(month, lists)| (month.clone(), lists.certified.len() as f64)),
    );
    let pending = Trace::bar("SP ou CT non certifiés").with_points(
        history
            .iter()
            .map(|(month, lists)| (month.clone(), lists.pending().len() as f64)),
    );

    Chart::new()
        .x_axis(Axis::titled("Mois"))
        .y_axis(Axis::titled("Nombre"))
        .grouped()
        .trace(certified)
        .trace(pending)
}

/// Domains from `domains` that end at least one of `emails`, sorted.
pub fn verified_domains(emails: &[String], domains: &HashSet<String>) -> Vec<String> {
    let mut present: Vec<String> = domains
        .iter()
        .filter(|d| emails.iter().any(|e| e.ends_with(d.as_str())))
        .cloned()
        .collect();
    present.sort();
    present
}

/// `issues.json` entries are single-key objects `{organization_id: message}`.
pub fn parse_issues(value: &Value) -> Vec<(String, String)> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.as_object()?.iter().next())
        .map(|(id, message)| {
            let message = match message {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (id.clone(), message)
        })
        .collect()
}

/// Dated folder names (`2024-01-31`) among the dashboard entries.
pub fn dated_folders(entries: &[String]) -> Vec<&str> {
    entries
        .iter()
        .map(String::as_str)
        .filter(|e| e.starts_with("20"))
        .collect()
}

async fn id_list(storage: &StorageClient, day: &str, file: &str) -> Result<Vec<String>> {
    let text = storage.get_file_content(&format!("{day}/{file}")).await?;
    Ok(serde_json::from_str(&text)?)
}

/// Clients the certification refresh talks to.
pub struct CertificationSources<'a> {
    pub storage: &'a StorageClient,
    pub catalog: &'a CatalogClient,
    pub sources: &'a SourcesClient,
}

pub async fn refresh(
    clients: CertificationSources<'_>,
    max_suggestions: usize,
) -> Result<CertificationReport> {
    let entries = clients.storage.list_dashboard_entries().await?;
    let last_days = latest_day_of_each_month(dated_folders(&entries));
    let Some(latest_day) = last_days.values().next_back().cloned() else {
        return Err(MonitorError::NotFound(
            "No certification snapshot in the dashboard folder".to_string(),
        ));
    };

    let mut history = BTreeMap::new();
    for (month, day) in &last_days {
        let lists = MonthLists {
            certified: id_list(clients.storage, day, "certified.json").await?,
            sp_or_ct: id_list(clients.storage, day, "SP_or_CT.json").await?,
        };
        history.insert(month.clone(), lists);
    }
    debug!("Loaded certification lists for {} months", history.len());

    let mut candidates = history
        .values()
        .next_back()
        .map(MonthLists::pending)
        .unwrap_or_default();
    fastrand::shuffle(&mut candidates);

    let mut suggestions = Vec::new();
    for organization_id in candidates {
        if suggestions.len() == max_suggestions {
            break;
        }
        if let Some(suggestion) =
            suggest(&clients, &organization_id, suggestions.len()).await?
        {
            suggestions.push(suggestion);
        }
    }

    let issues_text = clients
        .storage
        .get_file_content(&format!("{latest_day}/issues.json"))
        .await?;
    let mut issues = Vec::new();
    for (organization_id, message) in parse_issues(&serde_json::from_str(&issues_text)?) {
        if let Some(name) = clients.catalog.organization_name(&organization_id).await? {
            issues.push(CertificationIssue {
                url: clients.catalog.organization_page(&organization_id),
                organization_id,
                name,
                message,
            });
        }
    }

    info!(
        "Certification refresh from {}: {} suggestions, {} issues",
        latest_day,
        suggestions.len(),
        issues.len()
    );
    Ok(CertificationReport {
        chart: chart(&history),
        suggestions,
        issues,
    })
}

/// Build the suggestion for one organization, `None` when it is already
/// certified or exposes no badges.
async fn suggest(
    clients: &CertificationSources<'_>,
    organization_id: &str,
    row: usize,
) -> Result<Option<CertificationSuggestion>> {
    let org = clients
        .catalog
        .organization(organization_id, ORGANIZATION_FIELDS)
        .await?;
    let Some(badges) = org.badges.as_ref() else {
        debug!("Organization {} exposes no badges", organization_id);
        return Ok(None);
    };
    if org.has_badge(CERTIFIED_BADGE) {
        debug!("Organization {} certified since the last snapshot", organization_id);
        return Ok(None);
    }

    let mut emails = Vec::with_capacity(org.members.len());
    for member in &org.members {
        if let Some(email) = clients.catalog.user_email(&member.user.uri).await? {
            emails.push(email);
        }
    }
    let domains = clients
        .sources
        .valid_email_domains(org.business_number_id.as_deref())
        .await?;

    Ok(Some(CertificationSuggestion {
        row,
        organization_id: organization_id.to_string(),
        name: org.name.clone().unwrap_or_else(|| organization_id.to_string()),
        created_at: org
            .created_at
            .as_deref()
            .map(|d| d.chars().take(10).collect())
            .unwrap_or_default(),
        url: clients.catalog.organization_page(organization_id),
        verified_domains: verified_domains(&emails, &domains),
        emails,
        badges: badges.iter().map(|b| b.kind.clone()).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lists(certified: &[&str], sp_or_ct: &[&str]) -> MonthLists {
        MonthLists {
            certified: certified.iter().map(|s| s.to_string()).collect(),
            sp_or_ct: sp_or_ct.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn pending_excludes_certified() {
        assert_eq!(lists(&["a"], &["a", "b", "c"]).pending(), vec!["b", "c"]);
    }

    #[test]
    fn chart_counts_per_month() {
        let mut history = BTreeMap::new();
        history.insert("2024-01".to_string(), lists(&["a"], &["a", "b"]));
        history.insert("2024-02".to_string(), lists(&["a", "b"], &["a", "b", "c", "d"]));

        let chart = chart(&history);
        assert_eq!(chart.bar_mode, crate::charts::BarMode::Group);
        assert_eq!(chart.traces[0].y, vec![1.0, 2.0]);
        assert_eq!(chart.traces[1].y, vec![1.0, 2.0]);
        assert_eq!(chart.traces[1].x, vec!["2024-01", "2024-02"]);
    }

    #[test]
    fn verified_domains_need_a_matching_email() {
        let emails = vec!["jane@paris.fr".to_string(), "bob@gmail.com".to_string()];
        let domains: HashSet<String> = ["paris.fr", "ville.paris"].iter().map(|s| s.to_string()).collect();
        assert_eq!(verified_domains(&emails, &domains), vec!["paris.fr"]);
    }

    #[test]
    fn issues_are_single_key_objects() {
        let issues = parse_issues(&json!([
            {"org-1": "SIRET fermé"},
            {"org-2": 42},
            "ignored"
        ]));
        assert_eq!(
            issues,
            vec![
                ("org-1".to_string(), "SIRET fermé".to_string()),
                ("org-2".to_string(), "42".to_string())
            ]
        );
    }

    #[test]
    fn only_dated_folders() {
        let entries = vec![
            "2024-01-31".to_string(),
            "stats_support.csv".to_string(),
            "2023-12-30".to_string(),
        ];
        assert_eq!(dated_folders(&entries), vec!["2024-01-31", "2023-12-30"]);
    }
}
