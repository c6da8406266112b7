//! SIRET suggestions from the consolidated charging-station (IRVE) file.
//!
//! Operators declare their name and SIREN next to the data.gouv.fr
//! organization publishing the rows. When both names are close enough and
//! the organization has a single SIREN, its headquarters SIRET is proposed
//! for attachment.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clients::{CatalogClient, RegistryClient, SourcesClient};
use crate::error::Result;
use crate::matching::name_similarity;
use crate::tabular::Table;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IrveRow {
    pub operator_name: String,
    pub siren: String,
    pub organization: Option<String>,
}

/// Rows with an operator name and a SIREN, without duplicates.
pub fn parse_irve(text: &str) -> Result<Vec<IrveRow>> {
    let table = Table::from_csv(text)?;
    let name = table.column("nom_amenageur")?;
    let siren = table.column("siren_amenageur")?;
    let organization = table.column("datagouv_organization_or_owner")?;

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for row in &table.rows {
        let (Some(operator_name), Some(siren)) = (table.cell(row, name), table.cell(row, siren))
        else {
            continue;
        };
        let parsed = IrveRow {
            operator_name: operator_name.to_string(),
            siren: siren.to_string(),
            organization: table.cell(row, organization).map(str::to_string),
        };
        if seen.insert(parsed.clone()) {
            rows.push(parsed);
        }
    }
    Ok(rows)
}

/// An organization whose operator names all matched with a single SIREN.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub organization: String,
    pub operator_name: String,
    pub siren: String,
    pub score: u8,
}

/// Matching rows grouped per organization in first-seen order. Organizations
/// matched with several distinct SIRENs are ambiguous and left out.
pub fn candidates(rows: &[IrveRow], threshold: u8) -> Vec<MatchCandidate> {
    let mut order: Vec<&str> = Vec::new();
    let mut matched: Vec<(&IrveRow, u8)> = Vec::new();

    for row in rows {
        let Some(organization) = row.organization.as_deref() else {
            continue;
        };
        let score = name_similarity(Some(organization), Some(row.operator_name.as_str()));
        if score <= threshold {
            continue;
        }
        if !order.contains(&organization) {
            order.push(organization);
        }
        matched.push((row, score));
    }

    order
        .into_iter()
        .filter_map(|organization| {
            let rows: Vec<&(&IrveRow, u8)> = matched
                .iter()
                .filter(|(r, _)| r.organization.as_deref() == Some(organization))
                .collect();
            let sirens: HashSet<&str> = rows.iter().map(|(r, _)| r.siren.as_str()).collect();
            if sirens.len() != 1 {
                debug!("Organization {} matched {} SIRENs", organization, sirens.len());
                return None;
            }
            let (first, score) = rows[0];
            Some(MatchCandidate {
                organization: organization.to_string(),
                operator_name: first.operator_name.clone(),
                siren: first.siren.clone(),
                score: *score,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiretSuggestion {
    /// Position in the displayed list, echoed back by actions.
    pub row: usize,
    pub organization_id: String,
    pub name: String,
    pub matched_name: String,
    pub score: u8,
    pub siren: String,
    pub siret: String,
    pub url: String,
}

/// Clients the SIRET refresh talks to.
pub struct SiretSources<'a> {
    pub catalog: &'a CatalogClient,
    pub registry: &'a RegistryClient,
    pub sources: &'a SourcesClient,
}

pub async fn refresh(
    clients: SiretSources<'_>,
    threshold: u8,
    max_suggestions: usize,
) -> Result<Vec<SiretSuggestion>> {
    let text = clients
        .sources
        .get_text(&clients.sources.config().irve_csv_url)
        .await?;
    let rows = parse_irve(&text)?;
    let candidates = candidates(&rows, threshold);
    debug!(
        "{} IRVE rows, {} candidate organizations above {}",
        rows.len(),
        candidates.len(),
        threshold
    );

    let mut suggestions = Vec::new();
    for candidate in candidates {
        if suggestions.len() == max_suggestions {
            break;
        }
        let Some(siret) = clients.registry.siret_from_siren(&candidate.siren).await else {
            continue;
        };
        let org = clients
            .catalog
            .organization(&candidate.organization, "name,business_number_id")
            .await?;
        if org.business_number_id.as_deref().is_some_and(|b| !b.is_empty()) {
            debug!("Organization {} already has a SIRET", candidate.organization);
            continue;
        }

        suggestions.push(SiretSuggestion {
            row: suggestions.len(),
            url: clients.catalog.organization_page(&candidate.organization),
            name: org.name.unwrap_or_else(|| candidate.organization.clone()),
            organization_id: candidate.organization,
            matched_name: candidate.operator_name,
            score: candidate.score,
            siren: candidate.siren,
            siret,
        });
    }

    info!("SIRET refresh produced {} suggestions", suggestions.len());
    Ok(suggestions)
}
