use reqwest::Method;
use serde_json::Value;

use crate::api::ApiClient;
use crate::error::ApiResult;
use crate::models::{AuthResponse, Credentials, CurrentUser, Registration};

impl ApiClient {
    /// The token is read off whatever body came back; an empty or non-object
    /// body yields `token: None` instead of a decode failure.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<AuthResponse> {
        let body = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let raw = self
            .send(Method::POST, "/auth/login", Some(serde_json::to_value(&body)?))
            .await?;
        let token = raw
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(AuthResponse { token })
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> ApiResult<()> {
        let body = Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post_unit("/auth/register", &body).await
    }

    pub async fn current_user(&self) -> ApiResult<CurrentUser> {
        self.get("/auth/me").await
    }
}
