use crate::api::{AdminUsersQuery, ApiClient};
use crate::error::ApiResult;
use crate::models::{AdminUser, AdminUserUpdate, CurrentUser, FeedReview, PageResponse, Role};
use crate::navigation::Route;
use crate::views::feed;
use crate::views::{Confirmation, Mutation, PageStatus};

pub const SELF_DELETE: &str = "Tu propio usuario no se puede eliminar desde este panel.";

/// Edit modal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEdit {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Controller for `/admin/users`.
pub struct AdminUsersPage {
    client: ApiClient,
    latest_limit: usize,
    pub status: PageStatus,
    pub error: Option<String>,
    pub current_user: Option<CurrentUser>,
    pub users: Vec<AdminUser>,
    pub latest_reviews: Vec<FeedReview>,
    pub loading_reviews: bool,
    /// Zero-based.
    pub page: u32,
    pub size: u32,
    /// Never below 1.
    pub total_pages: u32,
    pub search_input: String,
    pub search: String,
    pub editing: Option<UserEdit>,
    pub saving: Mutation<i64>,
    pub deleting_user: Mutation<i64>,
    pub deleting_review: Mutation<i64>,
    pub user_confirmation: Confirmation<i64>,
    pub review_confirmation: Confirmation<i64>,
}

impl AdminUsersPage {
    pub fn new(client: ApiClient, size: u32, latest_limit: usize) -> Self {
        Self {
            client,
            latest_limit,
            status: PageStatus::Idle,
            error: None,
            current_user: None,
            users: Vec::new(),
            latest_reviews: Vec::new(),
            loading_reviews: true,
            page: 0,
            size,
            total_pages: 1,
            search_input: String::new(),
            search: String::new(),
            editing: None,
            saving: Mutation::Idle,
            deleting_user: Mutation::Idle,
            deleting_review: Mutation::Idle,
            user_confirmation: Confirmation::default(),
            review_confirmation: Confirmation::default(),
        }
    }

    pub fn banner(&self) -> Option<&str> {
        match &self.status {
            PageStatus::Errored(msg) => Some(msg),
            _ => self.error.as_deref(),
        }
    }

    pub fn page_label(&self) -> String {
        format!("Página {} de {}", self.page + 1, self.total_pages)
    }

    fn query(&self) -> AdminUsersQuery {
        AdminUsersQuery {
            page: self.page,
            size: self.size,
            search: self.search.clone(),
        }
    }

    /// Check the caller is an admin (others are sent back to `/feet`), then
    /// load the users page and the reviews panel in parallel.
    pub async fn init(&mut self) {
        self.status = PageStatus::Loading;
        self.error = None;

        let me = match self.client.current_user().await {
            Ok(me) => me,
            Err(err) => {
                self.status = PageStatus::Errored(err.user_message());
                return;
            }
        };
        let is_admin = me.is_admin();
        self.current_user = Some(me);
        if !is_admin {
            tracing::warn!("Non-admin reached the admin panel, redirecting");
            self.client.navigator().replace(Route::Feet.path());
            self.status = PageStatus::Ready;
            return;
        }

        self.loading_reviews = true;
        let query = self.query();
        let (users, snapshot) = tokio::join!(
            self.client.admin_users(&query),
            feed::load_snapshot(&self.client, None, "", self.latest_limit),
        );
        self.apply_reviews(snapshot);
        let users = match users {
            Ok(data) => {
                self.apply_users(data);
                if self.clamp_page() {
                    self.reload_users().await.map(|_| ())
                } else {
                    Ok(())
                }
            }
            Err(err) => Err(err),
        };
        match users {
            Ok(()) => self.status = PageStatus::Ready,
            Err(err) => self.status = PageStatus::Errored(err.user_message()),
        }
    }

    fn apply_users(&mut self, data: PageResponse<AdminUser>) -> usize {
        self.users = data.content;
        self.total_pages = data.total_pages.max(1);
        self.users.len()
    }

    /// Pull `page` back inside `0..total_pages`. True when it moved.
    fn clamp_page(&mut self) -> bool {
        if self.page < self.total_pages {
            return false;
        }
        self.page = self.total_pages - 1;
        true
    }

    fn apply_reviews(&mut self, snapshot: ApiResult<feed::FeedSnapshot>) {
        match snapshot {
            Ok(snapshot) => self.latest_reviews = snapshot.latest,
            Err(err) => {
                tracing::warn!("Latest reviews unavailable: {}", err);
                self.latest_reviews.clear();
            }
        }
        self.loading_reviews = false;
    }

    /// Fetch the current page; returns how many users came back. A page past
    /// the last one the server reports is clamped and fetched again.
    async fn reload_users(&mut self) -> ApiResult<usize> {
        let data = self.client.admin_users(&self.query()).await?;
        let count = self.apply_users(data);
        if !self.clamp_page() {
            return Ok(count);
        }
        let data = self.client.admin_users(&self.query()).await?;
        Ok(self.apply_users(data))
    }

    async fn reload_users_or_report(&mut self) {
        if let Err(err) = self.reload_users().await {
            self.error = Some(err.user_message());
        }
    }

    pub async fn refresh_reviews(&mut self) {
        self.loading_reviews = true;
        let snapshot = feed::load_snapshot(&self.client, None, "", self.latest_limit).await;
        self.apply_reviews(snapshot);
    }

    /// Trim the input, go back to the first page and reload.
    pub async fn search(&mut self, input: &str) {
        self.search_input = input.to_string();
        self.search = input.trim().to_string();
        self.page = 0;
        self.error = None;
        self.reload_users_or_report().await;
    }

    pub async fn previous_page(&mut self) -> bool {
        if self.page == 0 {
            return false;
        }
        self.page -= 1;
        self.reload_users_or_report().await;
        true
    }

    pub async fn next_page(&mut self) -> bool {
        if self.page + 1 >= self.total_pages {
            return false;
        }
        self.page += 1;
        self.reload_users_or_report().await;
        true
    }

    pub fn open_edit(&mut self, user_id: i64) -> bool {
        let Some(user) = self.users.iter().find(|u| u.id == user_id) else {
            return false;
        };
        self.editing = Some(UserEdit {
            user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        });
        true
    }

    /// Ignored while the edit is being saved.
    pub fn close_edit(&mut self) {
        if self.saving.is_pending() {
            return;
        }
        self.editing = None;
    }

    /// Save the modal and patch the single changed row in place.
    pub async fn save_edit(&mut self) -> bool {
        let Some(edit) = self.editing.clone() else {
            return false;
        };
        self.error = None;
        self.saving = Mutation::Pending(edit.user_id);

        let update = AdminUserUpdate {
            email: edit.email.trim().to_string(),
            role: edit.role,
        };
        match self.client.update_admin_user(edit.user_id, &update).await {
            Ok(updated) => {
                tracing::info!("Updated user {} ({})", updated.id, updated.role);
                if let Some(row) = self.users.iter_mut().find(|u| u.id == updated.id) {
                    *row = updated;
                }
                self.saving = Mutation::Succeeded(edit.user_id);
                self.close_edit();
                true
            }
            Err(err) => {
                let message = err.user_message();
                self.error = Some(message.clone());
                self.saving = Mutation::Failed(edit.user_id, message);
                false
            }
        }
    }

    pub fn is_self(&self, user_id: i64) -> bool {
        self.current_user.as_ref().is_some_and(|me| me.id == user_id)
    }

    /// Open the confirmation panel. Admins cannot delete themselves.
    pub fn request_delete_user(&mut self, user_id: i64) -> bool {
        if self.is_self(user_id) {
            self.error = Some(SELF_DELETE.to_string());
            return false;
        }
        if !self.users.iter().any(|u| u.id == user_id) {
            return false;
        }
        self.user_confirmation.request(user_id);
        true
    }

    pub fn cancel_delete_user(&mut self) -> bool {
        let busy = self.deleting_user.is_pending();
        self.user_confirmation.cancel(busy)
    }

    /// Delete the confirmed user and reload. If that empties a page other than
    /// the first, step back one page.
    pub async fn confirm_delete_user(&mut self) -> bool {
        let Some(user_id) = self.user_confirmation.confirmed() else {
            return false;
        };
        if self.is_self(user_id) {
            self.user_confirmation.close();
            return false;
        }

        self.error = None;
        self.deleting_user = Mutation::Pending(user_id);
        let outcome = async {
            self.client.delete_admin_user(user_id).await?;
            let remaining = self.reload_users().await?;
            if remaining == 0 && self.page > 0 {
                self.page -= 1;
                self.reload_users().await?;
            }
            Ok::<_, crate::error::ApiError>(())
        }
        .await;

        match outcome {
            Ok(()) => {
                tracing::info!("Deleted user {}", user_id);
                self.deleting_user = Mutation::Succeeded(user_id);
                self.user_confirmation.close();
                true
            }
            Err(err) => {
                let message = err.user_message();
                self.error = Some(message.clone());
                self.deleting_user = Mutation::Failed(user_id, message);
                false
            }
        }
    }

    pub fn request_delete_review(&mut self, review_id: i64) -> bool {
        if !self.latest_reviews.iter().any(|r| r.review.id == review_id) {
            return false;
        }
        self.review_confirmation.request(review_id);
        true
    }

    pub fn cancel_delete_review(&mut self) -> bool {
        let busy = self.deleting_review.is_pending();
        self.review_confirmation.cancel(busy)
    }

    /// Delete a review from the side panel; only that panel is refreshed.
    pub async fn confirm_delete_review(&mut self) -> bool {
        let Some(review_id) = self.review_confirmation.confirmed() else {
            return false;
        };

        self.error = None;
        self.deleting_review = Mutation::Pending(review_id);
        match self.client.delete_review(review_id).await {
            Ok(()) => {
                self.deleting_review = Mutation::Succeeded(review_id);
                self.review_confirmation.close();
                self.refresh_reviews().await;
                true
            }
            Err(err) => {
                let message = err.user_message();
                self.error = Some(message.clone());
                self.deleting_review = Mutation::Failed(review_id, message);
                false
            }
        }
    }
}
