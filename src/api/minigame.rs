use crate::api::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::models::MinigameLibrary;

pub const LIBRARY_ERROR: &str = "No se pudo cargar la librería del minijuego";

impl ApiClient {
    /// Fetch the local image library. Unauthenticated; every failure collapses
    /// into a single message.
    pub async fn minigame_library(&self, folder: Option<&str>) -> ApiResult<MinigameLibrary> {
        let mut url = format!("{}/api/minigame/library", self.library_url());
        if let Some(folder) = folder.filter(|f| !f.is_empty()) {
            let query: String = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("folder", folder)
                .finish();
            url.push('?');
            url.push_str(&query);
        }

        let response = self.http().get(&url).send().await.map_err(|e| {
            tracing::warn!("Library request failed: {}", e);
            ApiError::Message(LIBRARY_ERROR.to_string())
        })?;
        if !response.status().is_success() {
            tracing::warn!("Library request returned {}", response.status());
            return Err(ApiError::Message(LIBRARY_ERROR.to_string()));
        }
        response
            .json::<MinigameLibrary>()
            .await
            .map_err(|_| ApiError::Message(LIBRARY_ERROR.to_string()))
    }
}
