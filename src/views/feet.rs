use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use base64::Engine;
use futures::future::try_join_all;
use regex::Regex;
use serde_json::Value;

use crate::api::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{ArchType, CurrentUser, FeedReview, Foot, NewFoot};
use crate::views::feed::{self, FeetStats};
use crate::views::{Confirmation, Mutation, PageStatus};

pub const NOT_AN_IMAGE: &str = "El archivo seleccionado no es una imagen";
pub const IMAGE_READ_ERROR: &str = "No se pudo leer la imagen";
pub const REQUIRED_FIELDS: &str = "El título y la imagen son obligatorios";
pub const IMAGE_STORE_ERROR: &str =
    "El backend no pudo guardar la imagen subida. Revisa imageUrl en backend (usar TEXT o @Lob).";

/// Payload fields checked for the id of the foot a create collided with.
const CONFLICT_ID_FIELDS: [&str; 4] = ["existingId", "conflictId", "footId", "id"];

/// Local state of the "create foot" form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FootForm {
    pub title: String,
    pub image_url: String,
    pub arch_type: ArchType,
    pub selected_file: Option<String>,
    pub uploading: bool,
}

impl FootForm {
    /// State after a successful create.
    fn cleared() -> Self {
        Self {
            arch_type: ArchType::PesPlanus,
            ..Self::default()
        }
    }
}

/// Modal shown when the backend reports the foot already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateFoot {
    /// `None` when neither the payload nor the message named the foot.
    pub existing_id: Option<i64>,
    pub message: String,
}

impl DuplicateFoot {
    pub fn from_error(err: &ApiError) -> Self {
        let (message, payload) = match err {
            ApiError::Http {
                message, payload, ..
            } => (message.clone(), payload.as_ref()),
            other => (other.user_message(), None),
        };

        let existing_id = payload
            .and_then(conflict_id_from_payload)
            .or_else(|| conflict_id_from_message(&message));
        if existing_id.is_none() {
            tracing::debug!("Conflict without a recognisable foot id: {}", message);
        }

        Self {
            existing_id,
            message,
        }
    }
}

fn conflict_id_from_payload(payload: &Value) -> Option<i64> {
    CONFLICT_ID_FIELDS.iter().find_map(|field| {
        let value = payload.get(field)?;
        value
            .as_i64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
    })
}

/// Best-effort scrape of "... id 12", "id=12" or "#12" from free text.
pub fn conflict_id_from_message(message: &str) -> Option<i64> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:\bid\b|#)\D{0,3}?(\d+)").expect("duplicate id pattern compiles")
    });
    pattern
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Controller for `/feet`: list, side panel, create form and deletes.
pub struct FeetPage {
    client: ApiClient,
    latest_limit: usize,
    pub status: PageStatus,
    pub error: Option<String>,
    pub feet: Vec<Foot>,
    pub current_user: Option<CurrentUser>,
    pub latest_reviews: Vec<FeedReview>,
    pub stats: FeetStats,
    pub loading_reviews: bool,
    pub form: FootForm,
    pub creating: Mutation<()>,
    pub deleting: Mutation<i64>,
    pub delete_confirmation: Confirmation<i64>,
    pub duplicate: Option<DuplicateFoot>,
}

impl FeetPage {
    pub fn new(client: ApiClient, latest_limit: usize) -> Self {
        Self {
            client,
            latest_limit,
            status: PageStatus::Idle,
            error: None,
            feet: Vec::new(),
            current_user: None,
            latest_reviews: Vec::new(),
            stats: FeetStats::default(),
            loading_reviews: true,
            form: FootForm::default(),
            creating: Mutation::Idle,
            deleting: Mutation::Idle,
            delete_confirmation: Confirmation::default(),
            duplicate: None,
        }
    }

    /// Text for the page banner, if any.
    pub fn banner(&self) -> Option<&str> {
        match &self.status {
            PageStatus::Errored(msg) => Some(msg),
            _ => self.error.as_deref(),
        }
    }

    /// Fetch feet and the current user in parallel, then the side panel.
    pub async fn load(&mut self) {
        self.status = PageStatus::Loading;
        self.error = None;

        let fetched = tokio::try_join!(self.client.list_feet(), self.client.current_user());
        match fetched {
            Ok((feet, me)) => {
                let username = me.username.clone();
                self.feet = feet.clone();
                self.current_user = Some(me);
                self.load_side_panel(Some(feet), username).await;
                self.status = PageStatus::Ready;
            }
            Err(err) => {
                tracing::warn!("Feet page load failed: {}", err);
                self.status = PageStatus::Errored(err.user_message());
            }
        }
    }

    /// Refresh only the latest-reviews panel and the stats.
    pub async fn refresh_reviews(&mut self) {
        let username = self
            .current_user
            .as_ref()
            .map(|u| u.username.clone())
            .unwrap_or_default();
        self.load_side_panel(None, username).await;
    }

    /// Re-run `refresh_reviews` every `every`, reporting each refresh.
    pub async fn watch<F>(&mut self, every: Duration, mut on_refresh: F)
    where
        F: FnMut(&FeetPage),
    {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            self.refresh_reviews().await;
            on_refresh(self);
        }
    }

    async fn load_side_panel(&mut self, feet: Option<Vec<Foot>>, username: String) {
        self.loading_reviews = true;
        match feed::load_snapshot(&self.client, feet, &username, self.latest_limit).await {
            Ok(snapshot) => {
                self.latest_reviews = snapshot.latest;
                self.stats = snapshot.stats;
            }
            Err(err) => {
                tracing::warn!("Latest reviews unavailable: {}", err);
                self.latest_reviews.clear();
                self.stats = FeetStats::default();
            }
        }
        self.loading_reviews = false;
    }

    /// Load a local file into the form as a `data:` URL. Non-images are
    /// rejected before anything is read.
    pub async fn attach_image(&mut self, path: &Path) -> bool {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        if mime.type_() != mime_guess::mime::IMAGE {
            self.error = Some(NOT_AN_IMAGE.to_string());
            return false;
        }

        self.error = None;
        self.form.uploading = true;
        self.form.selected_file = path.file_name().map(|n| n.to_string_lossy().into_owned());

        let attached = match tokio::fs::read(path).await {
            Ok(bytes) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                self.form.image_url = format!("data:{};base64,{}", mime.essence_str(), encoded);
                true
            }
            Err(e) => {
                tracing::warn!("Could not read {}: {}", path.display(), e);
                self.error = Some(IMAGE_READ_ERROR.to_string());
                self.form.selected_file = None;
                false
            }
        };
        self.form.uploading = false;
        attached
    }

    /// Submit the create form. Returns true when the foot was created.
    pub async fn create_foot(&mut self) -> bool {
        self.error = None;
        self.duplicate = None;

        let title = self.form.title.trim().to_string();
        let image_url = self.form.image_url.trim().to_string();
        if title.is_empty() || image_url.is_empty() {
            self.error = Some(REQUIRED_FIELDS.to_string());
            return false;
        }

        let body = NewFoot {
            title,
            image_url,
            arch_type: self.form.arch_type,
        };
        self.creating = Mutation::Pending(());

        match self.client.create_foot(&body).await {
            Ok(foot) => {
                tracing::info!("Created foot {} ({})", foot.id, foot.title);
                self.creating = Mutation::Succeeded(());
                self.form = FootForm::cleared();
                self.load().await;
                true
            }
            Err(err) => {
                let message = if err.is_conflict() {
                    self.duplicate = Some(DuplicateFoot::from_error(&err));
                    err.user_message()
                } else if err.status() == Some(500) && body.image_url.starts_with("data:image/") {
                    self.error = Some(IMAGE_STORE_ERROR.to_string());
                    IMAGE_STORE_ERROR.to_string()
                } else {
                    let message = err.user_message();
                    self.error = Some(message.clone());
                    message
                };
                self.creating = Mutation::Failed((), message);
                false
            }
        }
    }

    pub fn dismiss_duplicate(&mut self) {
        self.duplicate = None;
    }

    /// Admins may delete anything, users only their own feet.
    pub fn can_delete(&self, foot: &Foot) -> bool {
        match &self.current_user {
            Some(user) => user.is_admin() || user.username == foot.owner_username,
            None => false,
        }
    }

    /// Open the confirmation panel for `foot_id`.
    pub fn request_delete(&mut self, foot_id: i64) -> bool {
        let allowed = self
            .feet
            .iter()
            .find(|foot| foot.id == foot_id)
            .is_some_and(|foot| self.can_delete(foot));
        if allowed {
            self.delete_confirmation.request(foot_id);
        }
        allowed
    }

    pub fn cancel_delete(&mut self) -> bool {
        let busy = self.deleting.is_pending();
        self.delete_confirmation.cancel(busy)
    }

    /// Delete the confirmed foot and reload. Admins fall back to removing the
    /// foot's reviews first when the plain delete is rejected.
    pub async fn confirm_delete(&mut self) -> bool {
        let Some(foot_id) = self.delete_confirmation.confirmed() else {
            return false;
        };

        self.error = None;
        self.deleting = Mutation::Pending(foot_id);

        let is_admin = self.current_user.as_ref().is_some_and(CurrentUser::is_admin);
        let result = match self.client.delete_foot(foot_id).await {
            Ok(()) => Ok(()),
            Err(err) if is_admin => match self.cascade_delete(foot_id).await {
                Ok(()) => Ok(()),
                Err(fallback) => {
                    tracing::warn!("Cascade delete of foot {} failed: {}", foot_id, fallback);
                    Err(err)
                }
            },
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                tracing::info!("Deleted foot {}", foot_id);
                self.deleting = Mutation::Succeeded(foot_id);
                self.delete_confirmation.close();
                self.load().await;
                true
            }
            Err(err) => {
                let message = err.user_message();
                self.error = Some(message.clone());
                self.deleting = Mutation::Failed(foot_id, message);
                false
            }
        }
    }

    async fn cascade_delete(&self, foot_id: i64) -> ApiResult<()> {
        let reviews = self.client.list_reviews(foot_id).await?;
        tracing::warn!(
            "Removing {} reviews before deleting foot {}",
            reviews.len(),
            foot_id
        );
        try_join_all(reviews.iter().map(|review| self.client.delete_review(review.id))).await?;
        self.client.delete_foot(foot_id).await
    }
}
