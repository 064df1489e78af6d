use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::{CurrentUser, Foot, Review, ReviewInput};
use crate::views::{Confirmation, Mutation, PageStatus};

/// Backend phrase signalling the one-review-per-foot rule.
const ALREADY_REVIEWED: &str = "already review this foot";

pub const ALREADY_REVIEWED_MESSAGE: &str = "Ya tienes una review en este foot. Solo puedes publicar una review por pie, pero puedes editar la que ya hiciste.";
pub const FOOT_NOT_FOUND: &str = "Foot no encontrado";
pub const INVALID_RATING: &str = "La puntuación debe estar entre 1 y 5";

const DEFAULT_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewForm {
    pub rating: u8,
    pub comment: String,
}

impl Default for ReviewForm {
    fn default() -> Self {
        Self {
            rating: DEFAULT_RATING,
            comment: String::new(),
        }
    }
}

impl ReviewForm {
    fn to_input(&self) -> Result<ReviewInput, &'static str> {
        if !(1..=5).contains(&self.rating) {
            return Err(INVALID_RATING);
        }
        Ok(ReviewInput {
            rate_aspect: self.rating,
            comment: self.comment.clone(),
        })
    }
}

/// Edit modal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEdit {
    pub review_id: i64,
    pub form: ReviewForm,
}

/// Controller for `/feet/{id}`.
pub struct FootDetailPage {
    client: ApiClient,
    foot_id: i64,
    pub status: PageStatus,
    pub error: Option<String>,
    pub foot: Option<Foot>,
    pub reviews: Vec<Review>,
    pub current_user: Option<CurrentUser>,
    pub form: ReviewForm,
    pub editing: Option<ReviewEdit>,
    pub saving_edit: bool,
    pub deleting: Mutation<i64>,
    pub delete_confirmation: Confirmation<i64>,
    /// Friendly modal text, shown instead of the error banner.
    pub friendly_popup: Option<String>,
}

impl FootDetailPage {
    pub fn new(client: ApiClient, foot_id: i64) -> Self {
        Self {
            client,
            foot_id,
            status: PageStatus::Idle,
            error: None,
            foot: None,
            reviews: Vec::new(),
            current_user: None,
            form: ReviewForm::default(),
            editing: None,
            saving_edit: false,
            deleting: Mutation::Idle,
            delete_confirmation: Confirmation::default(),
            friendly_popup: None,
        }
    }

    pub fn foot_id(&self) -> i64 {
        self.foot_id
    }

    pub fn banner(&self) -> Option<&str> {
        match &self.status {
            PageStatus::Errored(msg) => Some(msg),
            _ => self.error.as_deref(),
        }
    }

    fn is_admin(&self) -> bool {
        self.current_user.as_ref().is_some_and(CurrentUser::is_admin)
    }

    /// Foot, its reviews and the current user, fetched in parallel.
    pub async fn load(&mut self) {
        self.status = PageStatus::Loading;
        self.error = None;

        let fetched = tokio::try_join!(
            self.client.foot_by_id(self.foot_id),
            self.client.list_reviews(self.foot_id),
            self.client.current_user(),
        );
        match fetched {
            Ok((foot, reviews, me)) => {
                self.foot = foot;
                self.reviews = reviews;
                self.current_user = Some(me);
                self.status = PageStatus::Ready;
            }
            Err(err) => {
                tracing::warn!("Foot {} load failed: {}", self.foot_id, err);
                self.status = PageStatus::Errored(err.user_message());
            }
        }
    }

    /// Post a review. A second review on the same foot opens the friendly
    /// popup instead of the banner.
    pub async fn create_review(&mut self) -> bool {
        self.error = None;
        let input = match self.form.to_input() {
            Ok(input) => input,
            Err(msg) => {
                self.error = Some(msg.to_string());
                return false;
            }
        };
        if input.comment.trim().is_empty() {
            self.error = Some("El comentario es obligatorio".to_string());
            return false;
        }

        match self.client.create_review(self.foot_id, &input).await {
            Ok(review) => {
                tracing::info!("Created review {} on foot {}", review.id, self.foot_id);
                self.form = ReviewForm::default();
                self.load().await;
                true
            }
            Err(err) if is_already_reviewed(&err) => {
                self.friendly_popup = Some(ALREADY_REVIEWED_MESSAGE.to_string());
                false
            }
            Err(err) => {
                self.error = Some(err.user_message());
                false
            }
        }
    }

    pub fn dismiss_popup(&mut self) {
        self.friendly_popup = None;
    }

    /// Only the author may edit a review.
    pub fn can_edit(&self, review: &Review) -> bool {
        self.current_user
            .as_ref()
            .is_some_and(|user| user.username == review.review_username)
    }

    pub fn open_edit(&mut self, review_id: i64) -> bool {
        let Some(review) = self.reviews.iter().find(|r| r.id == review_id) else {
            return false;
        };
        if !self.can_edit(review) {
            return false;
        }
        self.editing = Some(ReviewEdit {
            review_id,
            form: ReviewForm {
                rating: review.rate_aspect,
                comment: review.comment.clone(),
            },
        });
        true
    }

    /// Ignored while the edit is being saved.
    pub fn close_edit(&mut self) {
        if self.saving_edit {
            return;
        }
        self.editing = None;
    }

    pub async fn save_edit(&mut self) -> bool {
        let Some(edit) = self.editing.clone() else {
            return false;
        };
        self.error = None;
        let input = match edit.form.to_input() {
            Ok(input) => input,
            Err(msg) => {
                self.error = Some(msg.to_string());
                return false;
            }
        };

        self.saving_edit = true;
        let result = self.client.update_review(edit.review_id, &input).await;
        let saved = match result {
            Ok(_) => {
                self.load().await;
                true
            }
            Err(err) => {
                self.error = Some(err.user_message());
                false
            }
        };
        self.saving_edit = false;
        if saved {
            self.close_edit();
        }
        saved
    }

    /// Admin only: open the confirmation panel for a review.
    pub fn request_delete(&mut self, review_id: i64) -> bool {
        if !self.is_admin() || !self.reviews.iter().any(|r| r.id == review_id) {
            return false;
        }
        self.delete_confirmation.request(review_id);
        true
    }

    pub fn cancel_delete(&mut self) -> bool {
        let busy = self.deleting.is_pending();
        self.delete_confirmation.cancel(busy)
    }

    pub async fn confirm_delete(&mut self) -> bool {
        let Some(review_id) = self.delete_confirmation.confirmed() else {
            return false;
        };
        if !self.is_admin() {
            return false;
        }

        self.error = None;
        self.deleting = Mutation::Pending(review_id);
        match self.client.delete_review(review_id).await {
            Ok(()) => {
                self.deleting = Mutation::Succeeded(review_id);
                self.load().await;
                self.delete_confirmation.close();
                true
            }
            Err(err) => {
                let message = err.user_message();
                self.error = Some(message.clone());
                self.deleting = Mutation::Failed(review_id, message);
                false
            }
        }
    }
}

fn is_already_reviewed(err: &ApiError) -> bool {
    err.user_message().to_lowercase().contains(ALREADY_REVIEWED)
}
