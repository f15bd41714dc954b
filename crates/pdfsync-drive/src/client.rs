//! Google Drive v3 API client
//!
//! Provides a typed HTTP client for the Drive endpoints PDFSync needs:
//! listing a folder, downloading content, and the folder lookup, creation
//! and move calls used for archiving. Handles the bearer header, query
//! construction, pagination and status mapping.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pdfsync_drive::client::DriveClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = DriveClient::new("access-token-here");
//! let folder = "1AbCdEf".parse()?;
//! let files = client
//!     .list_files(&folder, "application/pdf", "modifiedTime desc")
//!     .await?;
//! println!("{} PDFs", files.len());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use pdfsync_core::domain::{RemoteFile, RemoteId};

use crate::DriveError;

/// Base URL for the Google APIs
pub const DRIVE_BASE_URL: &str = "https://www.googleapis.com";

/// MIME type Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Default number of files requested per listing page
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Partial response fields requested for listings
const LIST_FIELDS: &str = "nextPageToken,files(id,name,modifiedTime,size)";

const FILES_PATH: &str = "/drive/v3/files";

// ============================================================================
// Drive API response types
// ============================================================================

/// One page of `files.list`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListResponse {
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// File resource, restricted to the requested fields
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
    modified_time: Option<DateTime<Utc>>,
    /// int64 values are serialized as strings by the API
    size: Option<String>,
}

impl DriveFile {
    fn into_remote_file(self) -> Result<RemoteFile, DriveError> {
        let id = RemoteId::new(self.id)
            .map_err(|e| DriveError::InvalidResponse(format!("bad file id: {e}")))?;
        let mut file = RemoteFile::new(id, self.name);
        file.modified_time = self.modified_time;
        file.size = self.size.and_then(|s| s.parse().ok());
        Ok(file)
    }
}

#[derive(Debug, Deserialize)]
struct FileIdResponse {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateFolderRequest<'a> {
    name: &'a str,
    mime_type: &'a str,
    parents: [&'a str; 1],
}

/// Escapes a literal for use inside a single-quoted Drive query string
pub fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn parse_id(raw: String) -> Result<RemoteId, DriveError> {
    RemoteId::new(raw).map_err(|e| DriveError::InvalidResponse(format!("bad id: {e}")))
}

// ============================================================================
// DriveClient
// ============================================================================

/// HTTP client for Google Drive v3 calls
///
/// Wraps `reqwest::Client` with the bearer header and base URL. The access
/// token is replaced in place by the provider after a refresh.
pub struct DriveClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests
    base_url: String,
    /// Current OAuth2 access token
    access_token: String,
    /// Files requested per listing page
    page_size: u32,
}

impl DriveClient {
    /// Creates a new DriveClient with the given access token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, DRIVE_BASE_URL)
    }

    /// Creates a new DriveClient with a custom base URL (useful for testing)
    ///
    /// # Arguments
    /// * `access_token` - A valid OAuth2 access token
    /// * `base_url` - Custom base URL for API requests
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the listing page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Updates the access token (e.g., after a token refresh)
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
        debug!("Updated DriveClient access token");
    }

    /// Returns a reference to the current access token
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// Automatically prepends the base URL and adds the Authorization header.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(&self.access_token)
    }

    /// Sends `request` and maps any non-2xx status to a [`DriveError`]
    async fn send(&self, request: RequestBuilder) -> Result<Response, DriveError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(DriveError::from_status(status, &body))
    }

    async fn json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, DriveError> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| DriveError::InvalidResponse(e.to_string()))
    }

    /// Lists every non-trashed file of `mime_type` directly inside `folder_id`
    ///
    /// Follows `nextPageToken` until the listing is exhausted.
    #[instrument(skip(self), fields(folder = %folder_id))]
    pub async fn list_files(
        &self,
        folder_id: &RemoteId,
        mime_type: &str,
        order_by: &str,
    ) -> Result<Vec<RemoteFile>, DriveError> {
        let query = format!(
            "'{}' in parents and mimeType='{}' and trashed=false",
            escape_query_literal(folder_id.as_str()),
            escape_query_literal(mime_type)
        );
        let page_size = self.page_size.to_string();

        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let mut request = self.request(Method::GET, FILES_PATH).query(&[
                ("q", query.as_str()),
                ("orderBy", order_by),
                ("fields", LIST_FIELDS),
                ("pageSize", page_size.as_str()),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: FileListResponse = self.json(request).await?;
            pages += 1;
            for file in page.files {
                files.push(file.into_remote_file()?);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(files = files.len(), pages, "Listed folder");
        Ok(files)
    }

    /// Downloads a file's raw bytes (`alt=media`)
    #[instrument(skip(self), fields(file = %file_id))]
    pub async fn download(&self, file_id: &RemoteId) -> Result<Vec<u8>, DriveError> {
        let path = format!("{FILES_PATH}/{}", file_id.as_str());
        let response = self
            .send(self.request(Method::GET, &path).query(&[("alt", "media")]))
            .await?;
        let bytes = response.bytes().await?;

        debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    /// Finds a non-trashed child folder of `parent_id` named exactly `name`
    ///
    /// Returns the first match when several folders share the name.
    #[instrument(skip(self), fields(parent = %parent_id))]
    pub async fn find_folder(
        &self,
        parent_id: &RemoteId,
        name: &str,
    ) -> Result<Option<RemoteId>, DriveError> {
        let query = format!(
            "name='{}' and '{}' in parents and mimeType='{}' and trashed=false",
            escape_query_literal(name),
            escape_query_literal(parent_id.as_str()),
            FOLDER_MIME_TYPE
        );
        let request = self.request(Method::GET, FILES_PATH).query(&[
            ("q", query.as_str()),
            ("fields", "files(id)"),
            ("pageSize", "1"),
        ]);

        let page: FileListResponse = self.json(request).await?;
        page.files
            .into_iter()
            .next()
            .map(|f| parse_id(f.id))
            .transpose()
    }

    /// Creates a folder named `name` inside `parent_id`
    #[instrument(skip(self), fields(parent = %parent_id))]
    pub async fn create_folder(
        &self,
        parent_id: &RemoteId,
        name: &str,
    ) -> Result<RemoteId, DriveError> {
        let body = CreateFolderRequest {
            name,
            mime_type: FOLDER_MIME_TYPE,
            parents: [parent_id.as_str()],
        };
        let request = self
            .request(Method::POST, FILES_PATH)
            .query(&[("fields", "id")])
            .json(&body);

        let created: FileIdResponse = self.json(request).await?;
        debug!(id = %created.id, "Created folder");
        parse_id(created.id)
    }

    /// Re-parents a file from `from_parent` to `to_parent`
    #[instrument(skip(self), fields(file = %file_id))]
    pub async fn move_file(
        &self,
        file_id: &RemoteId,
        from_parent: &RemoteId,
        to_parent: &RemoteId,
    ) -> Result<(), DriveError> {
        let path = format!("{FILES_PATH}/{}", file_id.as_str());
        let request = self
            .request(Method::PATCH, &path)
            .query(&[
                ("addParents", to_parent.as_str()),
                ("removeParents", from_parent.as_str()),
                ("fields", "id,parents"),
            ])
            .json(&serde_json::json!({}));

        self.send(request).await?;
        debug!(from = %from_parent, to = %to_parent, "Moved file");
        Ok(())
    }
}
