use crate::config::{ApiSettings, Settings};
use crate::core::fallback::{fallback_content, filter_by_category};
use crate::core::questionnaire::RiskScorer;
use crate::models::{
    AnonymousSession, ApiResponse, ContentCategory, ContentSource, EducationalContent,
    ErrorBody, RiskData, RiskResult, SessionRequest, StoredResult,
};
use crate::models::requests::random_suffix;
use crate::services::cache::{CacheKey, ResponseCache};
use crate::services::clock::{Clock, SystemClock};
use crate::services::storage::{LocalStorage, StorageKeys};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

/// Header carrying the anonymous session token
pub const SESSION_HEADER: &str = "X-Session-Id";

/// Errors surfaced by the scoring service client
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out. Check your internet connection.")]
    Timeout,

    #[error("No internet connection. Check your network and try again.")]
    Network,

    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    /// The service answered but reported `success: false`
    #[error("{message}")]
    Service {
        code: String,
        message: String,
        details: Option<Value>,
    },

    #[error("An unknown error occurred: {0}")]
    Unknown(String),
}

impl ApiError {
    /// Stable code shown to the user and used in JSON output
    pub fn code(&self) -> String {
        match self {
            Self::Timeout => "TIMEOUT".to_string(),
            Self::Network => "NETWORK_ERROR".to_string(),
            Self::Http { status, .. } => format!("HTTP_{}", status),
            Self::Service { code, .. } => code.clone(),
            Self::Unknown(_) => "UNKNOWN_ERROR".to_string(),
        }
    }

    /// Short heading for an error notification
    pub fn title(&self) -> &'static str {
        match self {
            Self::Timeout | Self::Network => "No connection",
            Self::Http { status, .. } if *status >= 500 => "Server error",
            _ => "Error",
        }
    }

    pub fn to_error_body(&self) -> ErrorBody {
        let details = match self {
            Self::Http { details, .. } | Self::Service { details, .. } => details.clone(),
            _ => None,
        };
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
            details,
        }
    }

    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() || err.is_request() {
            Self::Network
        } else {
            Self::Unknown(err.to_string())
        }
    }
}

/// Default message for a status when the body carries none
fn status_message(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "Session expired. Please submit again.".to_string(),
        404 => "Service temporarily unavailable".to_string(),
        s if s >= 500 => "Server error. Please try again later.".to_string(),
        _ => "Something went wrong".to_string(),
    }
}

/// Educational content together with where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct EducationResponse {
    pub content: EducationalContent,
    pub source: ContentSource,
}

/// Client for the remote scoring service
///
/// Handles all communication with the backend including:
/// - Anonymous session bootstrap and renewal
/// - Risk calculation (never cached)
/// - Educational content (cached, with a built-in fallback)
/// - Persisting the last computed result on the device
pub struct ApiClient {
    base_url: String,
    client: Client,
    health_timeout: Duration,
    storage: Arc<LocalStorage>,
    cache: ResponseCache,
    clock: Arc<dyn Clock>,
    session: Mutex<Option<String>>,
}

impl ApiClient {
    /// Create a new client
    pub fn new(
        settings: &ApiSettings,
        storage: Arc<LocalStorage>,
        cache: ResponseCache,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .user_agent(format!(
                "MoyRiskApp/{} ({})",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS
            ))
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Unknown(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
            health_timeout: Duration::from_millis(settings.health_timeout_ms),
            storage,
            cache,
            clock,
            session: Mutex::new(None),
        })
    }

    /// Build a client with file storage and the system clock from settings
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        let storage = Arc::new(LocalStorage::file(&settings.storage.path));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache = ResponseCache::new(
            storage.clone(),
            clock.clone(),
            settings.cache.l1_cache_size.unwrap_or(100),
            settings.cache.ttl_secs.unwrap_or(3600),
        );
        Self::new(&settings.api, storage, cache, clock)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Current session id, bootstrapping one if needed
    ///
    /// Order: in-memory slot, then local storage, then a new session from
    /// the service.
    pub async fn session_id(&self) -> String {
        if let Some(id) = self.session.lock().await.clone() {
            return id;
        }

        match self.storage.get_item(StorageKeys::SESSION_ID).await {
            Ok(Some(id)) => {
                tracing::info!("Session restored: {}", id);
                *self.session.lock().await = Some(id.clone());
                id
            }
            Ok(None) => self.create_session().await,
            Err(e) => {
                tracing::warn!("Failed to read stored session, creating a new one: {}", e);
                self.create_session().await
            }
        }
    }

    /// Ask the service for a new anonymous session
    ///
    /// Falls back to a local pseudo-session id when the service cannot
    /// issue one. The local id is kept in memory only.
    async fn create_session(&self) -> String {
        let now = self.clock.now_millis();
        let request = SessionRequest::for_this_device(now);

        let session_id = match self.request_session(&request).await {
            Ok(session) => {
                if let Err(e) = self
                    .storage
                    .set_item(StorageKeys::SESSION_ID, &session.session_id)
                    .await
                {
                    tracing::warn!("Failed to persist session: {}", e);
                }
                tracing::info!("New session created: {}", session.session_id);
                session.session_id
            }
            Err(e) => {
                let local = format!("local_{}_{}", now, random_suffix());
                tracing::error!("Error creating session ({}), using {}", e, local);
                local
            }
        };

        *self.session.lock().await = Some(session_id.clone());
        session_id
    }

    async fn request_session(&self, request: &SessionRequest) -> Result<AnonymousSession, ApiError> {
        let response = self
            .client
            .post(self.url("/anonymous-session"))
            .json(request)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: status_message(status),
                details: None,
            });
        }

        let body = response.text().await.map_err(ApiError::from_transport)?;
        unwrap_envelope(&body)
    }

    /// Send a request with the session header and decode the envelope
    ///
    /// A 401 renews the session once; the request itself is not repeated.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, ApiError> {
        let session_id = self.session_id().await;

        let response = request
            .header(SESSION_HEADER, &session_id)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("API request to {} failed: {}", path, e);
                ApiError::from_transport(e)
            })?;

        let status = response.status();
        tracing::debug!("API response: {} {}", status.as_u16(), path);

        let body = response.text().await.map_err(ApiError::from_transport)?;

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Session {} rejected, creating a new one", session_id);
            self.create_session().await;
        }

        if !status.is_success() {
            let details: Option<Value> = serde_json::from_str(&body).ok();
            let message = details
                .as_ref()
                .and_then(|d| {
                    d.pointer("/error/message")
                        .or_else(|| d.pointer("/detail/error/message"))
                })
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| status_message(status));

            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
                details,
            });
        }

        unwrap_envelope(&body)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T, ApiError> {
        // Cache-busting timestamp so intermediaries never serve a stale GET
        let stamp = self.clock.now_millis().to_string();
        let query = params
            .iter()
            .chain(std::iter::once(&("_t", stamp.as_str())))
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let url = format!("{}?{}", self.url(path), query);
        tracing::debug!("API request: GET {}", path);
        self.execute(self.client.get(&url), path).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        tracing::debug!("API request: POST {}", path);
        self.execute(self.client.post(self.url(path)).json(body), path).await
    }

    /// Submit answers and receive the computed risk
    ///
    /// A successful result is persisted as the last result on the device.
    pub async fn calculate_risk(&self, data: &RiskData) -> Result<RiskResult, ApiError> {
        let result: RiskResult = self.post("/calculate-risk", data).await?;

        if !result.has_valid_percentage() {
            return Err(ApiError::Unknown(format!(
                "Risk percentage out of range: {}",
                result.risk_percentage
            )));
        }

        tracing::info!(
            "Risk calculated: {} ({}%), id {}",
            result.risk_category,
            result.risk_percentage,
            result.calculation_id
        );

        self.save_last_result(data, &result).await;
        Ok(result)
    }

    /// Fetch educational content, using the cache and the built-in fallback
    ///
    /// Never fails: if the service cannot be reached the static dataset is
    /// returned, filtered by category.
    pub async fn get_educational_content(&self, category: Option<ContentCategory>) -> EducationResponse {
        let key = CacheKey::education(category);

        match self.cache.get(&key).await {
            Ok(Some(cached)) => match serde_json::from_value::<EducationalContent>(cached) {
                Ok(content) => {
                    return EducationResponse {
                        content,
                        source: ContentSource::Cache,
                    }
                }
                Err(e) => tracing::warn!("Discarding unreadable cache entry {}: {}", key, e),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!("Cache lookup failed for {}: {}", key, e),
        }

        let params: Vec<(&str, &str)> = category.map(|c| ("category", c.as_str())).into_iter().collect();

        let fetched = self
            .get::<Value>("/educational-content", &params)
            .await
            .and_then(|value| {
                serde_json::from_value::<EducationalContent>(value.clone())
                    .map(|content| (value, content))
                    .map_err(|e| ApiError::Unknown(format!("Invalid educational content: {}", e)))
            });

        match fetched {
            Ok((raw, content)) => {
                if let Err(e) = self.cache.set(&key, raw).await {
                    tracing::warn!("Failed to cache {}: {}", key, e);
                }
                EducationResponse {
                    content,
                    source: ContentSource::Network,
                }
            }
            Err(e) => {
                tracing::warn!("Educational content unavailable ({}), using built-in content", e);
                EducationResponse {
                    content: filter_by_category(fallback_content(), category),
                    source: ContentSource::Fallback,
                }
            }
        }
    }

    /// Auxiliary risk factor metadata, passed through as-is
    pub async fn get_risk_factors(&self) -> Result<Value, ApiError> {
        self.get("/risk-factors", &[]).await
    }

    /// Session already held in memory or storage, without contacting the service
    async fn existing_session(&self) -> Option<String> {
        if let Some(id) = self.session.lock().await.clone() {
            return Some(id);
        }

        match self.storage.get_item(StorageKeys::SESSION_ID).await {
            Ok(Some(id)) => {
                *self.session.lock().await = Some(id.clone());
                Some(id)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read stored session: {}", e);
                None
            }
        }
    }

    /// Liveness probe with a short timeout
    ///
    /// Never creates a session; an existing one is attached if present.
    pub async fn check_server_health(&self) -> bool {
        let mut request = self.client.get(self.url("/health")).timeout(self.health_timeout);
        if let Some(session_id) = self.existing_session().await {
            request = request.header(SESSION_HEADER, session_id);
        }
        let result = request.send().await;

        match result {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                tracing::info!("Server health check failed: {}", e);
                false
            }
        }
    }

    /// The last submission persisted on this device, if any
    pub async fn get_last_result(&self) -> Option<StoredResult> {
        match self.storage.get_json(StorageKeys::LAST_RESULT).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!("Error getting last result: {}", e);
                None
            }
        }
    }

    async fn save_last_result(&self, data: &RiskData, result: &RiskResult) {
        let stored = StoredResult {
            risk_data: data.clone(),
            result: result.clone(),
            timestamp: self.clock.now_millis(),
        };

        if let Err(e) = self.storage.set_json(StorageKeys::LAST_RESULT, &stored).await {
            tracing::error!("Error saving last result: {}", e);
        }
    }

    /// Forget the last result and every cached response
    pub async fn clear_history(&self) {
        if let Err(e) = self.storage.remove_item(StorageKeys::LAST_RESULT).await {
            tracing::error!("Error clearing last result: {}", e);
        }
        if let Err(e) = self.cache.clear().await {
            tracing::error!("Error clearing cache: {}", e);
        }
    }
}

impl RiskScorer for ApiClient {
    async fn calculate_risk(&self, data: &RiskData) -> Result<RiskResult, ApiError> {
        ApiClient::calculate_risk(self, data).await
    }
}

/// Decode `{success, data, error}` into the payload or an error
fn unwrap_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let envelope: ApiResponse<T> = serde_json::from_str(body)
        .map_err(|e| ApiError::Unknown(format!("Invalid response format: {}", e)))?;

    if !envelope.success {
        let error = envelope.error.unwrap_or_else(|| ErrorBody {
            code: "UNKNOWN_ERROR".to_string(),
            message: "The service reported a failure".to_string(),
            details: None,
        });
        return Err(ApiError::Service {
            code: error.code,
            message: error.message,
            details: error.details,
        });
    }

    envelope
        .data
        .ok_or_else(|| ApiError::Unknown("Response is missing data".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ApiError::Timeout.code(), "TIMEOUT");
        assert_eq!(ApiError::Network.code(), "NETWORK_ERROR");
        assert_eq!(ApiError::Unknown("x".into()).code(), "UNKNOWN_ERROR");
        let http = ApiError::Http {
            status: 503,
            message: "down".into(),
            details: None,
        };
        assert_eq!(http.code(), "HTTP_503");
        assert_eq!(http.title(), "Server error");
    }

    #[test]
    fn test_error_body_keeps_details() {
        let err = ApiError::Service {
            code: "VALIDATION_ERROR".into(),
            message: "Invalid data".into(),
            details: Some(serde_json::json!(["age"])),
        };
        let body = err.to_error_body();
        assert_eq!(body.code, "VALIDATION_ERROR");
        assert_eq!(body.message, "Invalid data");
        assert_eq!(body.details, Some(serde_json::json!(["age"])));
    }

    #[test]
    fn test_unwrap_envelope() {
        let ok: i32 = unwrap_envelope(r#"{"success":true,"data":5}"#).unwrap();
        assert_eq!(ok, 5);

        let missing = unwrap_envelope::<i32>(r#"{"success":true}"#).unwrap_err();
        assert_eq!(missing.code(), "UNKNOWN_ERROR");

        let failed = unwrap_envelope::<i32>(
            r#"{"success":false,"error":{"code":"CALCULATION_ERROR","message":"boom"}}"#,
        )
        .unwrap_err();
        assert_eq!(failed.code(), "CALCULATION_ERROR");
        assert_eq!(failed.to_string(), "boom");

        assert!(matches!(unwrap_envelope::<i32>("<html>"), Err(ApiError::Unknown(_))));
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(status_message(StatusCode::NOT_FOUND), "Service temporarily unavailable");
        assert!(status_message(StatusCode::INTERNAL_SERVER_ERROR).starts_with("Server error"));
        assert_eq!(status_message(StatusCode::BAD_REQUEST), "Something went wrong");
    }
}
