use crate::api::ApiClient;
use crate::error::ApiResult;
use crate::models::{Foot, NewFoot, Review, ReviewInput, Swipe, SwipeAction, SwipeRequest};

impl ApiClient {
    pub async fn list_feet(&self) -> ApiResult<Vec<Foot>> {
        self.get("/feet").await
    }

    pub async fn create_foot(&self, foot: &NewFoot) -> ApiResult<Foot> {
        self.post("/feet", foot).await
    }

    pub async fn delete_foot(&self, foot_id: i64) -> ApiResult<()> {
        self.delete(&format!("/feet/{}", foot_id)).await
    }

    /// There is no single-foot endpoint; the list is searched instead.
    pub async fn foot_by_id(&self, foot_id: i64) -> ApiResult<Option<Foot>> {
        let feet = self.list_feet().await?;
        Ok(feet.into_iter().find(|foot| foot.id == foot_id))
    }

    pub async fn list_reviews(&self, foot_id: i64) -> ApiResult<Vec<Review>> {
        self.get(&format!("/feet/{}/reviews", foot_id)).await
    }

    pub async fn create_review(&self, foot_id: i64, review: &ReviewInput) -> ApiResult<Review> {
        self.post(&format!("/feet/{}/reviews", foot_id), review).await
    }

    pub async fn update_review(&self, review_id: i64, review: &ReviewInput) -> ApiResult<Review> {
        self.put(&format!("/feet/reviews/{}", review_id), review).await
    }

    pub async fn delete_review(&self, review_id: i64) -> ApiResult<()> {
        self.delete(&format!("/feet/reviews/{}", review_id)).await
    }

    pub async fn save_swipe(&self, foot_id: i64, action: SwipeAction) -> ApiResult<Swipe> {
        self.post(&format!("/feet/{}/swipe", foot_id), &SwipeRequest { action })
            .await
    }

    pub async fn my_swipes(&self) -> ApiResult<Vec<Swipe>> {
        self.get("/feet/swipes/me").await
    }
}
