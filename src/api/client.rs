use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::navigation::{Navigator, SESSION_EXPIRED_PATH};
use crate::session::SessionStore;

/// Handle to the backend. Cheap to clone; clones share the session and
/// navigator.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    library_url: String,
    session: SessionStore,
    navigator: Navigator,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        library_url: impl Into<String>,
        session: SessionStore,
        navigator: Navigator,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            library_url: library_url.into().trim_end_matches('/').to_string(),
            session,
            navigator,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn library_url(&self) -> &str {
        &self.library_url
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let data = self.send(Method::GET, path, None).await?;
        Ok(serde_json::from_value(data)?)
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let data = self
            .send(Method::POST, path, Some(serde_json::to_value(body)?))
            .await?;
        Ok(serde_json::from_value(data)?)
    }

    pub(crate) async fn put<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let data = self
            .send(Method::PUT, path, Some(serde_json::to_value(body)?))
            .await?;
        Ok(serde_json::from_value(data)?)
    }

    /// POST whose response body is ignored.
    pub(crate) async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<()> {
        self.send(Method::POST, path, Some(serde_json::to_value(body)?))
            .await
            .map(|_| ())
    }

    pub(crate) async fn delete(&self, path: &str) -> ApiResult<()> {
        self.send(Method::DELETE, path, None).await.map(|_| ())
    }

    /// Issue a request and return the permissively parsed body.
    ///
    /// Non-success statuses become `ApiError::Http`; a 401 also ends the
    /// session and leaves the page for the login screen.
    pub async fn send(&self, method: Method, path: &str, body: Option<Value>) -> ApiResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let response = request.send().await?;
        let status = response.status();
        let raw = response.text().await?;
        let data = parse_body(&raw);

        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                self.expire_session();
            }
            let err = ApiError::from_response(status.as_u16(), data);
            tracing::debug!("{} {} failed with {}: {}", method, path, status, err);
            return Err(err);
        }

        Ok(data)
    }

    fn expire_session(&self) {
        tracing::warn!("Session rejected by backend, clearing token");
        if let Err(e) = self.session.clear_token() {
            tracing::error!("Failed to clear session: {}", e);
        }
        if !self.navigator.on_auth_page() {
            self.navigator.replace(SESSION_EXPIRED_PATH);
        }
    }
}

/// JSON when parseable, the raw text otherwise, null when empty.
pub fn parse_body(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
