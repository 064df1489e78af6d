use crate::api::ApiClient;
use crate::navigation::Route;

pub const REGISTERED: &str = "Registro correcto. Ahora inicia sesión.";

/// Controller for `/register`.
pub struct RegisterPage {
    client: ApiClient,
    pub username: String,
    pub email: String,
    pub password: String,
    pub loading: bool,
    pub error: Option<String>,
    pub ok: Option<String>,
}

impl RegisterPage {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            username: String::new(),
            email: String::new(),
            password: String::new(),
            loading: false,
            error: None,
            ok: None,
        }
    }

    /// Register, then head to `/login`.
    pub async fn submit(&mut self) -> bool {
        self.error = None;
        self.ok = None;
        self.loading = true;

        let result = self
            .client
            .register(self.username.trim(), self.email.trim(), &self.password)
            .await;
        let registered = match result {
            Ok(()) => {
                tracing::info!("Registered {}", self.username.trim());
                self.ok = Some(REGISTERED.to_string());
                self.client.navigator().push(Route::Login.path());
                true
            }
            Err(err) => {
                self.error = Some(err.user_message());
                false
            }
        };
        self.loading = false;
        registered
    }
}
