use crate::api::ApiClient;
use crate::error::ApiError;
use crate::navigation::Route;

pub const MISSING_TOKEN: &str = "Respuesta de login inválida (sin token)";

/// Controller for `/login`.
pub struct LoginPage {
    client: ApiClient,
    pub username: String,
    pub password: String,
    pub loading: bool,
    pub error: Option<String>,
}

impl LoginPage {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            username: String::new(),
            password: String::new(),
            loading: false,
            error: None,
        }
    }

    /// Whether the page was reached through an expired-session redirect.
    pub fn session_expired(&self) -> bool {
        self.client
            .navigator()
            .current()
            .contains("reason=session-expired")
    }

    /// Log in, persist the token and move on to `/feet`. Re-entrant submits
    /// while a login is pending are ignored.
    pub async fn submit(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        self.error = None;

        let result = self
            .client
            .login(self.username.trim(), &self.password)
            .await
            .map_err(|err| err.user_message())
            .and_then(|auth| {
                auth.token
                    .filter(|token| !token.is_empty())
                    .ok_or_else(|| MISSING_TOKEN.to_string())
            });

        let logged_in = match result {
            Ok(token) => match self.client.session().save_token(&token) {
                Ok(()) => {
                    tracing::info!("Logged in as {}", self.username.trim());
                    self.client.navigator().replace(Route::Feet.path());
                    true
                }
                Err(e) => {
                    tracing::error!("Could not persist session: {}", e);
                    self.error = Some(ApiError::from(e).user_message());
                    false
                }
            },
            Err(message) => {
                self.error = Some(message);
                false
            }
        };
        self.loading = false;
        logged_in
    }
}

/// End the session from any page (sidebar "Cerrar sesión").
pub fn logout(client: &ApiClient) -> std::io::Result<()> {
    client.session().clear_token()?;
    client.navigator().replace(Route::Login.path());
    Ok(())
}
