//! Write-back actions triggered from suggestion rows.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clients::CatalogClient;
use crate::dashboards::certification::{CERTIFIED_BADGE, PUBLIC_SERVICE_BADGE};
use crate::error::{MonitorError, Result};

/// A row-level action, carrying everything needed to perform it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum DashboardAction {
    /// Add the public-service then the certified badge.
    Certify { row: usize, organization_id: String },
    /// Attach a SIRET as the organization's business number.
    Siretize {
        row: usize,
        organization_id: String,
        siret: String,
    },
    RemoveBadge {
        row: usize,
        organization_id: String,
        badge: String,
        current_badges: Vec<String>,
    },
}

impl DashboardAction {
    pub fn row(&self) -> usize {
        match self {
            DashboardAction::Certify { row, .. }
            | DashboardAction::Siretize { row, .. }
            | DashboardAction::RemoveBadge { row, .. } => *row,
        }
    }

    pub fn organization_id(&self) -> &str {
        match self {
            DashboardAction::Certify {
                organization_id, ..
            }
            | DashboardAction::Siretize {
                organization_id, ..
            }
            | DashboardAction::RemoveBadge {
                organization_id, ..
            } => organization_id,
        }
    }

    /// Reject actions that cannot succeed before calling the catalog.
    pub fn validate(&self) -> Result<()> {
        if !is_slug(self.organization_id()) {
            return Err(MonitorError::Validation(format!(
                "'{}' is not an organization id or slug",
                self.organization_id()
            )));
        }
        match self {
            DashboardAction::Certify { .. } => Ok(()),
            DashboardAction::Siretize { siret, .. } => {
                if is_siret(siret) {
                    Ok(())
                } else {
                    Err(MonitorError::Validation(format!(
                        "'{siret}' is not a SIRET (14 digits)"
                    )))
                }
            }
            DashboardAction::RemoveBadge {
                badge,
                current_badges,
                ..
            } => {
                if !is_slug(badge) {
                    Err(MonitorError::Validation(format!(
                        "'{badge}' is not a badge kind"
                    )))
                } else if current_badges.contains(badge) {
                    Ok(())
                } else {
                    Err(MonitorError::Validation(format!(
                        "Organization does not hold badge '{badge}'"
                    )))
                }
            }
        }
    }
}

/// Organization ids, slugs and badge kinds: ASCII letters, digits, `-`, `_`.
pub fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

pub fn is_siret(value: &str) -> bool {
    value.len() == 14 && value.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ActionStatus {
    Success,
    Error,
}

/// Result of an action, scoped to the row it was triggered from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub row: usize,
    pub organization_id: String,
    pub status: ActionStatus,
    pub message: String,
    pub url: String,
    /// Badges left after a removal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badges: Option<Vec<String>>,
}

impl ActionOutcome {
    fn new(
        action: &DashboardAction,
        catalog: &CatalogClient,
        status: ActionStatus,
        message: String,
    ) -> Self {
        Self {
            row: action.row(),
            organization_id: action.organization_id().to_string(),
            status,
            message,
            url: catalog.organization_page(action.organization_id()),
            badges: None,
        }
    }
}

/// Perform an action against the catalog.
///
/// Invalid actions are rejected with `Validation`. A failed write-back does
/// not fail the call: it is reported as an error outcome for that row.
pub async fn dispatch(action: &DashboardAction, catalog: &CatalogClient) -> Result<ActionOutcome> {
    action.validate()?;
    let organization_id = action.organization_id();

    let outcome = match action {
        DashboardAction::Certify { .. } => {
            for badge in [PUBLIC_SERVICE_BADGE, CERTIFIED_BADGE] {
                if let Err(e) = catalog.add_badge(organization_id, badge).await {
                    warn!("Certifying {} failed on badge {}: {}", organization_id, badge, e);
                    return Ok(ActionOutcome::new(
                        action,
                        catalog,
                        ActionStatus::Error,
                        "Une erreur est survenue en essayant de certifier cette organisation"
                            .to_string(),
                    ));
                }
            }
            let name = match catalog.organization_name(organization_id).await {
                Ok(Some(name)) => name,
                _ => organization_id.to_string(),
            };
            ActionOutcome::new(
                action,
                catalog,
                ActionStatus::Success,
                format!("{name} : certifiée"),
            )
        }
        DashboardAction::Siretize { siret, .. } => {
            match catalog.set_business_number(organization_id, siret).await {
                Ok(org) => ActionOutcome::new(
                    action,
                    catalog,
                    ActionStatus::Success,
                    format!(
                        "{} : siretisée avec {}",
                        org.name.as_deref().unwrap_or(organization_id),
                        siret
                    ),
                ),
                Err(e) => {
                    warn!("Setting SIRET on {} failed: {}", organization_id, e);
                    ActionOutcome::new(
                        action,
                        catalog,
                        ActionStatus::Error,
                        "Une erreur est survenue en essayant de SIRETiser cette organisation"
                            .to_string(),
                    )
                }
            }
        }
        DashboardAction::RemoveBadge {
            badge,
            current_badges,
            ..
        } => match catalog.remove_badge(organization_id, badge).await {
            Ok(()) => {
                let mut outcome = ActionOutcome::new(
                    action,
                    catalog,
                    ActionStatus::Success,
                    format!("Badge {badge} retiré"),
                );
                outcome.badges = Some(
                    current_badges
                        .iter()
                        .filter(|b| *b != badge)
                        .cloned()
                        .collect(),
                );
                outcome
            }
            Err(e) => {
                warn!("Removing badge {} from {} failed: {}", badge, organization_id, e);
                let mut outcome = ActionOutcome::new(
                    action,
                    catalog,
                    ActionStatus::Error,
                    format!("Une erreur est survenue en essayant de retirer le badge {badge}"),
                );
                outcome.badges = Some(current_badges.clone());
                outcome
            }
        },
    };

    info!(
        "Action on {} (row {}): {:?}",
        organization_id, outcome.row, outcome.status
    );
    Ok(outcome)
}
