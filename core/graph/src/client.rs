//! Microsoft Graph API client.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{header, Client, StatusCode};
use std::sync::Arc;
use tracing::debug;

use inboxdrive_auth::{CredentialProvider, DEFAULT_SCOPES};
use inboxdrive_common::{Error, ItemId, Result};

use crate::model::{DriveItemPayload, DrivePayload, ListPayload, MessagePayload, ProfilePayload};
use crate::service::{ListingItem, MessageSummary, Profile, ResourceClient, StorageQuota};

/// Microsoft Graph API base URL.
const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Characters escaped in the file-name segment of an upload URL.
const FILE_NAME_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Microsoft Graph implementation of the resource client.
///
/// Tokens are acquired silently from the injected credential provider
/// before each request.
pub struct GraphClient {
    http: Client,
    credentials: Arc<dyn CredentialProvider>,
    base_url: String,
}

impl GraphClient {
    /// Create a new Graph client.
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        let http = Client::builder()
            .user_agent("InboxDrive/0.1")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            credentials,
            base_url: GRAPH_API_BASE.to_string(),
        }
    }

    /// Point the client at a different API root (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Get authorization header.
    async fn auth_header(&self) -> Result<String> {
        let token = self.credentials.acquire_token(DEFAULT_SCOPES).await?;
        Ok(format!("Bearer {}", token))
    }

    fn children_url(&self, folder: Option<&ItemId>) -> String {
        match folder {
            Some(id) => format!("{}/me/drive/items/{}/children", self.base_url, id),
            None => format!("{}/me/drive/root/children", self.base_url),
        }
    }

    fn upload_url(&self, folder: Option<&ItemId>, name: &str) -> String {
        // "root" is a valid item-id alias for the drive root
        let parent = folder.map(|id| id.as_str()).unwrap_or("root");
        let encoded = utf8_percent_encode(name, FILE_NAME_SEGMENT);
        format!(
            "{}/me/drive/items/{}:/{}:/content",
            self.base_url, parent, encoded
        )
    }

    /// Handle API response with error checking.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::Network(format!("Failed to parse response: {}", e)))
        } else if status == StatusCode::NOT_FOUND {
            Err(Error::NotFound("Resource not found".to_string()))
        } else if status == StatusCode::UNAUTHORIZED {
            Err(Error::Authentication(
                "Invalid or expired token".to_string(),
            ))
        } else if status == StatusCode::FORBIDDEN {
            Err(Error::PermissionDenied("Access denied".to_string()))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::Network(format!("API error: {} - {}", status, body)))
        }
    }
}

#[async_trait]
impl ResourceClient for GraphClient {
    async fn profile(&self) -> Result<Profile> {
        let url = format!("{}/me", self.base_url);
        let auth = self.auth_header().await?;

        let response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to fetch profile: {}", e)))?;

        let payload: ProfilePayload = self.handle_response(response).await?;
        Ok(payload.into_profile())
    }

    async fn list_children(&self, folder: Option<&ItemId>) -> Result<Vec<ListingItem>> {
        let url = self.children_url(folder);
        let auth = self.auth_header().await?;

        let response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to list folder: {}", e)))?;

        let payload: ListPayload<DriveItemPayload> = self.handle_response(response).await?;
        debug!("Listed {} drive items", payload.value.len());

        payload
            .value
            .into_iter()
            .map(DriveItemPayload::into_item)
            .collect()
    }

    async fn quota(&self) -> Result<StorageQuota> {
        let url = format!("{}/me/drive", self.base_url);
        let auth = self.auth_header().await?;

        let response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to fetch quota: {}", e)))?;

        let payload: DrivePayload = self.handle_response(response).await?;
        Ok(payload.quota.into_quota())
    }

    async fn recent_messages(&self, top: usize) -> Result<Vec<MessageSummary>> {
        let url = format!("{}/me/messages", self.base_url);
        let auth = self.auth_header().await?;

        let response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, auth)
            .query(&[("$top", top.to_string())])
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to fetch messages: {}", e)))?;

        let payload: ListPayload<MessagePayload> = self.handle_response(response).await?;
        Ok(payload
            .value
            .into_iter()
            .map(MessagePayload::into_summary)
            .collect())
    }

    async fn upload(
        &self,
        folder: Option<&ItemId>,
        name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<ListingItem> {
        let url = self.upload_url(folder, name);
        let auth = self.auth_header().await?;

        let response = self
            .http
            .put(&url)
            .header(header::AUTHORIZATION, auth)
            .header(header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| Error::Upload(format!("Failed to upload {}: {}", name, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upload(format!(
                "Upload failed: {} - {}",
                status, body
            )));
        }

        let payload: DriveItemPayload = response
            .json()
            .await
            .map_err(|e| Error::Network(format!("Failed to parse upload response: {}", e)))?;
        payload.into_item()
    }
}
