//! Microsoft Graph directory source.
//!
//! Every request carries a bearer token from the configured
//! [`Authenticator`]. Collection responses are followed through
//! `@odata.nextLink` until exhausted.

use async_trait::async_trait;
use orgbook_core::{Authenticator, DirectoryError, DirectorySource, GroupRecord, Member, UserRecord};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

const GROUP_SELECT: &str = "$select=id,displayName,mail&$top=999";
const MEMBER_SELECT: &str = "$select=id,displayName,mail,userPrincipalName,jobTitle,department";
const USER_SELECT: &str =
    "$select=id,displayName,mail,userPrincipalName,department,jobTitle,officeLocation&$top=999";
const USER_TYPE: &str = "#microsoft.graph.user";

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

/// A `transitiveMembers` entry: users, groups, devices, ...
#[derive(Deserialize)]
struct DirectoryObject {
    #[serde(rename = "@odata.type")]
    odata_type: Option<String>,
    #[serde(flatten)]
    user: UserRecord,
}

pub struct GraphSource {
    client: reqwest::Client,
    base_url: String,
    auth: Arc<dyn Authenticator>,
}

impl std::fmt::Debug for GraphSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphSource")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GraphSource {
    pub fn new(
        base_url: impl Into<String>,
        auth: Arc<dyn Authenticator>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("orgbook/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        })
    }

    async fn get_all<T: DeserializeOwned>(
        &self,
        first: String,
        context: &str,
    ) -> Result<Vec<T>, DirectoryError> {
        let mut out = Vec::new();
        let mut next = Some(first);
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            let token = self.auth.acquire_token().await?;
            let response = self
                .client
                .get(&url)
                .bearer_auth(&token.0)
                .send()
                .await
                .map_err(|e| DirectoryError::upstream(context, e))?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                return Err(DirectoryError::AuthRequired(format!("{context}: {status}")));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(DirectoryError::upstream(
                    context,
                    format!("{status}: {}", body.trim()),
                ));
            }

            let page: Page<T> = response
                .json()
                .await
                .map_err(|e| DirectoryError::upstream(context, e))?;
            out.extend(page.value);
            next = page.next_link;
            pages += 1;
        }

        tracing::debug!(context, pages, items = out.len(), "graph collection read");
        Ok(out)
    }
}

#[async_trait]
impl DirectorySource for GraphSource {
    fn name(&self) -> &str {
        "graph"
    }

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, DirectoryError> {
        let url = format!("{}/groups?{GROUP_SELECT}", self.base_url);
        self.get_all(url, "groups").await
    }

    async fn list_group_members(&self, group_id: &str) -> Result<Vec<Member>, DirectoryError> {
        let url = format!(
            "{}/groups/{group_id}/transitiveMembers?{MEMBER_SELECT}",
            self.base_url
        );
        let objects: Vec<DirectoryObject> = self.get_all(url, "group members").await?;
        let total = objects.len();
        let members: Vec<Member> = objects
            .iter()
            .filter(|o| o.odata_type.as_deref() == Some(USER_TYPE))
            .map(|o| Member::from(&o.user))
            .collect();
        tracing::debug!(group = group_id, total, users = members.len(), "transitive members");
        Ok(members)
    }

    async fn list_all_users(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        let url = format!("{}/users?{USER_SELECT}", self.base_url);
        self.get_all(url, "users").await
    }
}
