//! HTTP client for the OpenProject v3 API.

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use opsync_core::CanonicalTask;

use crate::config::OpenProjectConfig;
use crate::error::UpstreamError;
use crate::mapping::map_work_package;
use crate::wire::{Collection, Project, User, WorkPackage};

const SORT_BY: &str = r#"[["updatedAt", "desc"]]"#;
const PROJECT_PAGE_SIZE: &str = "1000";

/// Effective sync scope, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfiguration {
    pub sync_limit: u32,
    pub sync_projects: Vec<String>,
    pub base_url: String,
    pub api_base_url: String,
    pub has_api_key: bool,
}

/// OpenProject API client.
pub struct OpenProjectClient {
    inner: reqwest::Client,
    config: OpenProjectConfig,
    api_base_url: String,
}

impl OpenProjectClient {
    /// Create a new client.
    pub fn new(config: OpenProjectConfig) -> Result<Self, UpstreamError> {
        let inner = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let api_base_url = config.api_base_url();

        info!(
            api_base_url = %api_base_url,
            limit = config.sync_limit,
            projects = ?config.sync_projects,
            "OpenProject client initialized"
        );

        Ok(Self {
            inner,
            config,
            api_base_url,
        })
    }

    /// Cheap connectivity check: list a single work package.
    pub async fn test_connection(&self) -> Result<(), UpstreamError> {
        let api_key = self.api_key()?;
        let response = self
            .get(api_key, "/work_packages")
            .query(&[("pageSize", "1")])
            .send()
            .await
            .map_err(|e| UpstreamError::Connection(e.to_string()))?;

        check_status(response)
            .map(|_| ())
            .map_err(|e| UpstreamError::Connection(e.to_string()))
    }

    /// Fetch the work packages assigned to the API key's user.
    ///
    /// Results are ordered by `updatedAt` descending, as returned upstream.
    pub async fn get_tasks(&self) -> Result<Vec<CanonicalTask>, UpstreamError> {
        let api_key = self.api_key()?;

        let user_id = match self.current_user_id().await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, "Could not resolve current user");
                return Err(UpstreamError::CurrentUser);
            }
        };

        let mut filters = vec![json!({
            "assignee": { "operator": "=", "values": [user_id] }
        })];

        if !self.config.sync_projects.is_empty() {
            let project_ids = match self.project_ids_by_pattern().await {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(error = %e, "Project lookup failed, syncing without project filter");
                    Vec::new()
                }
            };
            if !project_ids.is_empty() {
                filters.push(json!({
                    "project": { "operator": "=", "values": project_ids }
                }));
            }
        }

        let filters = serde_json::to_string(&filters)?;
        let page_size = self.config.sync_limit.to_string();
        debug!(filters = %filters, page_size = %page_size, "Listing work packages");

        let response = self
            .get(api_key, "/work_packages")
            .query(&[
                ("pageSize", page_size.as_str()),
                ("sortBy", SORT_BY),
                ("filters", filters.as_str()),
            ])
            .send()
            .await?;
        let collection: Collection<WorkPackage> = parse_json(response).await?;

        let tasks = collection
            .embedded
            .elements
            .iter()
            .map(map_work_package)
            .collect::<Result<Vec<_>, _>>()?;

        info!(count = tasks.len(), "Fetched tasks from OpenProject");
        Ok(tasks)
    }

    /// Resolve the id of the user owning the API key.
    pub async fn current_user_id(&self) -> Result<String, UpstreamError> {
        let api_key = self.api_key()?;
        let response = self.get(api_key, "/users/me").send().await?;
        let user: User = parse_json(response).await?;

        info!(
            user_id = user.id,
            first_name = user.first_name.as_deref().unwrap_or_default(),
            last_name = user.last_name.as_deref().unwrap_or_default(),
            email = user.email.as_deref().unwrap_or_default(),
            "Resolved current user"
        );
        Ok(user.id.to_string())
    }

    /// Ids of projects whose name contains any configured pattern.
    pub async fn project_ids_by_pattern(&self) -> Result<Vec<String>, UpstreamError> {
        let api_key = self.api_key()?;
        let response = self
            .get(api_key, "/projects")
            .query(&[("pageSize", PROJECT_PAGE_SIZE)])
            .send()
            .await?;
        let projects: Collection<Project> = parse_json(response).await?;

        let patterns: Vec<String> = self
            .config
            .sync_projects
            .iter()
            .map(|p| p.to_lowercase())
            .collect();

        let ids: Vec<String> = projects
            .embedded
            .elements
            .iter()
            .filter(|project| {
                let name = project.name.as_deref().unwrap_or_default().to_lowercase();
                patterns.iter().any(|p| name.contains(p.as_str()))
            })
            .map(|project| project.id.to_string())
            .collect();

        info!(count = ids.len(), patterns = ?self.config.sync_projects, "Matched projects");
        Ok(ids)
    }

    /// Effective sync scope.
    pub fn sync_configuration(&self) -> SyncConfiguration {
        SyncConfiguration {
            sync_limit: self.config.sync_limit,
            sync_projects: if self.config.sync_projects.is_empty() {
                vec!["All projects".to_string()]
            } else {
                self.config.sync_projects.clone()
            },
            base_url: self.config.base_url.clone(),
            api_base_url: self.api_base_url.clone(),
            has_api_key: self.config.api_key.is_some(),
        }
    }

    fn api_key(&self) -> Result<&str, UpstreamError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(UpstreamError::MissingApiKey)
    }

    fn get(&self, api_key: &str, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.api_base_url, path);
        debug!(url = %url, "GET request");
        self.inner
            .get(url)
            .basic_auth("apikey", Some(api_key))
            .header(reqwest::header::ACCEPT, "application/json")
    }
}

fn check_status(response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    warn!(status = status.as_u16(), url = %response.url(), "OpenProject request failed");
    Err(UpstreamError::Status {
        status: status.as_u16(),
    })
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, UpstreamError> {
    let response = check_status(response)?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
