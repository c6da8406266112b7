use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::ensure_success;
use crate::config::CatalogConfig;
use crate::error::{MonitorError, Result};

/// Name of the cursor field in paginated catalog responses.
const NEXT_PAGE: &str = "next_page";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Badge {
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberUser {
    pub uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub user: MemberUser,
}

/// Subset of an organization as returned with an `X-Fields` mask. Every
/// field is optional because the mask decides what comes back.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Organization {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub badges: Option<Vec<Badge>>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub business_number_id: Option<String>,
}

impl Organization {
    pub fn has_badge(&self, kind: &str) -> bool {
        self.badges
            .as_ref()
            .is_some_and(|badges| badges.iter().any(|b| b.kind == kind))
    }
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct BusinessNumberUpdate<'a> {
    business_number_id: &'a str,
}

/// Client for the data.gouv.fr REST API (`/api/1`).
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    config: CatalogConfig,
}

impl CatalogClient {
    pub fn new(client: Client, config: &CatalogConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// `<api>/organizations/<id>/<rest..>/`, each part kept inside its own
    /// path segment.
    fn organization_url(&self, organization_id: &str, rest: &[&str]) -> Result<String> {
        for part in std::iter::once(&organization_id).chain(rest) {
            if matches!(part.trim(), "" | "." | "..") {
                return Err(MonitorError::Validation(format!(
                    "'{part}' is not a valid catalog path segment"
                )));
            }
        }
        let mut url = Url::parse(&self.config.api_url)?;
        url.path_segments_mut()
            .map_err(|_| {
                MonitorError::Internal(format!(
                    "Catalog API URL {} cannot hold a path",
                    self.config.api_url
                ))
            })?
            .pop_if_empty()
            .push("organizations")
            .push(organization_id)
            .extend(rest)
            .push("");
        Ok(url.into())
    }

    /// Public page of an organization, for links in suggestion tables.
    pub fn organization_page(&self, slug: &str) -> String {
        format!(
            "{}/organizations/{}/",
            self.config.site_url.trim_end_matches('/'),
            slug
        )
    }

    pub fn site_url(&self) -> &str {
        self.config.site_url.trim_end_matches('/')
    }

    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.api_key {
            Some(ref key) => request.header("X-API-KEY", key),
            None => request,
        }
    }

    /// Collect every item of a paginated listing by following `next_page`.
    ///
    /// When `mask` is set it is sent as an `X-Fields` header, extended with
    /// the cursor field so pagination keeps working.
    pub async fn get_all(&self, url: &str, mask: Option<&str>) -> Result<Vec<Value>> {
        self.get_all_until(url, mask, |_| false).await
    }

    /// Like [`get_all`](Self::get_all), but stops requesting pages once
    /// `done` returns true for the items collected so far.
    pub async fn get_all_until<F>(
        &self,
        url: &str,
        mask: Option<&str>,
        mut done: F,
    ) -> Result<Vec<Value>>
    where
        F: FnMut(&[Value]) -> bool,
    {
        let fields = mask.map(|m| format!("{m},{NEXT_PAGE}"));
        let mut items = Vec::new();
        let mut next = Some(url.to_string());
        let mut pages = 0usize;

        while let Some(page_url) = next.take() {
            let mut request = self.authenticated(self.client.get(&page_url));
            if let Some(ref fields) = fields {
                request = request.header("X-Fields", fields);
            }

            let body: Value = ensure_success(request.send().await?).await?.json().await?;
            pages += 1;

            match body.get("data") {
                Some(Value::Array(data)) => items.extend(data.iter().cloned()),
                _ => {
                    return Err(MonitorError::Parse(format!(
                        "Paginated response from {page_url} has no data array"
                    )))
                }
            }

            if done(&items) {
                debug!("Stopped paging {} after {} pages", url, pages);
                break;
            }

            next = body
                .get(NEXT_PAGE)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
        }

        debug!("Fetched {} items over {} pages from {}", items.len(), pages, url);
        Ok(items)
    }

    /// Fetch one organization with the given field mask.
    pub async fn organization(&self, slug: &str, fields: &str) -> Result<Organization> {
        let url = self.organization_url(slug, &[])?;
        let resp = self
            .client
            .get(&url)
            .header("X-Fields", fields)
            .send()
            .await?;
        Ok(ensure_success(resp).await?.json().await?)
    }

    /// Display name of an organization, `None` when the API refuses.
    pub async fn organization_name(&self, slug: &str) -> Result<Option<String>> {
        let url = self.organization_url(slug, &[])?;
        let resp = self
            .client
            .get(&url)
            .header("X-Fields", "name")
            .send()
            .await?;
        if !resp.status().is_success() {
            debug!("Organization {} lookup returned {}", slug, resp.status());
            return Ok(None);
        }
        let org: Organization = resp.json().await?;
        Ok(org.name)
    }

    /// Email of a member, read from its user URI (requires the API key).
    pub async fn user_email(&self, uri: &str) -> Result<Option<String>> {
        let resp = self.authenticated(self.client.get(uri)).send().await?;
        let user: UserResponse = ensure_success(resp).await?.json().await?;
        Ok(user.email)
    }

    pub async fn add_badge(&self, organization_id: &str, kind: &str) -> Result<()> {
        let url = self.organization_url(organization_id, &["badges"])?;
        let resp = self
            .authenticated(self.client.post(&url))
            .json(&Badge {
                kind: kind.to_string(),
            })
            .send()
            .await?;
        ensure_success(resp).await?;
        info!("Added badge {} to organization {}", kind, organization_id);
        Ok(())
    }

    pub async fn remove_badge(&self, organization_id: &str, kind: &str) -> Result<()> {
        let url = self.organization_url(organization_id, &["badges", kind])?;
        let resp = self.authenticated(self.client.delete(&url)).send().await?;
        ensure_success(resp).await?;
        info!("Removed badge {} from organization {}", kind, organization_id);
        Ok(())
    }

    /// Attach a SIRET to an organization and return the updated organization.
    pub async fn set_business_number(
        &self,
        organization_id: &str,
        siret: &str,
    ) -> Result<Organization> {
        let url = self.organization_url(organization_id, &[])?;
        let resp = self
            .authenticated(self.client.put(&url))
            .json(&BusinessNumberUpdate {
                business_number_id: siret,
            })
            .send()
            .await?;
        let org = ensure_success(resp).await?.json().await?;
        info!("Set business number {} on organization {}", siret, organization_id);
        Ok(org)
    }
}
