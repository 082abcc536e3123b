use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{multipart, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::{
    ApiError, AskRequest, AskResponse, DocumentId, DocumentOut, FailureKind, LlmSettings,
    LlmSettingsUpdate, UploadResponse,
};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Covers the whole request; answers are generated server side, so keep it generous.
    pub request_timeout: Duration,
    pub max_file_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            max_file_bytes: 200 * 1024 * 1024,
        }
    }
}

/// Normalize a configured API location: bare hostnames are served over https.
pub fn normalize_api_base(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Source of raw document bytes for the viewer.
#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch_document(&self, document_id: DocumentId) -> Result<Vec<u8>, ApiError>;
}

/// The question-answering backend's HTTP surface.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn list_documents(&self) -> Result<Vec<DocumentOut>, ApiError>;
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadResponse, ApiError>;
    async fn delete_document(&self, document_id: DocumentId) -> Result<(), ApiError>;
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ApiError>;
    async fn settings(&self) -> Result<LlmSettings, ApiError>;
    async fn update_settings(&self, update: &LlmSettingsUpdate) -> Result<LlmSettings, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: ClientSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let mut base = Url::parse(&normalize_api_base(&settings.base_url))
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Address of a document's raw bytes, optionally with a `#page=` fragment.
    pub fn file_url(&self, document_id: DocumentId, page: Option<u32>) -> Result<Url, ApiError> {
        let mut url = self.endpoint(&format!("files/{document_id}"))?;
        if let Some(page) = page {
            url.set_fragment(Some(&format!("page={page}")));
        }
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let response = check_status(response).await?;
        response.json::<T>().await.map_err(map_reqwest_error)
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn list_documents(&self) -> Result<Vec<DocumentOut>, ApiError> {
        let response = self
            .client
            .get(self.endpoint("documents")?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::read_json(response).await
    }

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadResponse, ApiError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(map_reqwest_error)?;
        let form = multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(self.endpoint("upload")?)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::read_json(response).await
    }

    async fn delete_document(&self, document_id: DocumentId) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("documents/{document_id}"))?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response).await.map(|_| ())
    }

    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ApiError> {
        let response = self
            .client
            .post(self.endpoint("ask")?)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::read_json(response).await
    }

    async fn settings(&self) -> Result<LlmSettings, ApiError> {
        let response = self
            .client
            .get(self.endpoint("settings")?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::read_json(response).await
    }

    async fn update_settings(&self, update: &LlmSettingsUpdate) -> Result<LlmSettings, ApiError> {
        let response = self
            .client
            .post(self.endpoint("settings")?)
            .json(update)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::read_json(response).await
    }
}

#[async_trait::async_trait]
impl DocumentSource for ReqwestBackend {
    async fn fetch_document(&self, document_id: DocumentId) -> Result<Vec<u8>, ApiError> {
        let response = self
            .client
            .get(self.file_url(document_id, None)?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response).await?;

        let max_bytes = self.settings.max_file_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::new(
        FailureKind::HttpStatus(status.as_u16()),
        error_detail(status, &body),
    ))
}

/// Prefer the backend's `{"detail": "..."}` message, then the raw body, then the status line.
fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match value.get("detail") {
            Some(serde_json::Value::String(detail)) => return detail.clone(),
            Some(detail) if !detail.is_null() => return detail.to_string(),
            _ => {}
        }
    }
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        body.to_string()
    }
}

fn too_large(max_bytes: u64, actual: u64) -> ApiError {
    ApiError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "document too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    if err.is_builder() {
        return ApiError::new(FailureKind::InvalidUrl, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https() {
        assert_eq!(normalize_api_base("api.example.com"), "https://api.example.com");
        assert_eq!(
            normalize_api_base(" http://localhost:8000/ "),
            "http://localhost:8000"
        );
    }

    #[test]
    fn endpoints_keep_base_path() {
        let backend = ReqwestBackend::new(ClientSettings {
            base_url: "https://example.com/api".to_string(),
            ..ClientSettings::default()
        })
        .unwrap();
        assert_eq!(
            backend.endpoint("documents").unwrap().as_str(),
            "https://example.com/api/documents"
        );
        assert_eq!(
            backend.file_url(4, Some(12)).unwrap().as_str(),
            "https://example.com/api/files/4#page=12"
        );
    }

    #[test]
    fn error_detail_prefers_fastapi_detail() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(
            error_detail(status, r#"{"detail":"Only PDF files are supported."}"#),
            "Only PDF files are supported."
        );
        assert_eq!(error_detail(status, "plain failure"), "plain failure");
        assert_eq!(error_detail(status, ""), "400 Bad Request");
    }
}
