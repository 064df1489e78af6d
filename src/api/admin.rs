use crate::api::ApiClient;
use crate::error::ApiResult;
use crate::models::{AdminUser, AdminUserUpdate, PageResponse};

/// Server-side pagination parameters for the user list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUsersQuery {
    pub page: u32,
    pub size: u32,
    pub search: String,
}

impl Default for AdminUsersQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            search: String::new(),
        }
    }
}

impl AdminUsersQuery {
    /// `page=..&size=..[&search=..]`; blank searches are omitted.
    pub fn to_query_string(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("page", &self.page.to_string())
            .append_pair("size", &self.size.to_string());
        let search = self.search.trim();
        if !search.is_empty() {
            query.append_pair("search", search);
        }
        query.finish()
    }
}

impl ApiClient {
    pub async fn admin_users(&self, query: &AdminUsersQuery) -> ApiResult<PageResponse<AdminUser>> {
        self.get(&format!("/admin/users?{}", query.to_query_string()))
            .await
    }

    pub async fn update_admin_user(
        &self,
        user_id: i64,
        update: &AdminUserUpdate,
    ) -> ApiResult<AdminUser> {
        self.put(&format!("/admin/users/{}", user_id), update).await
    }

    pub async fn delete_admin_user(&self, user_id: i64) -> ApiResult<()> {
        self.delete(&format!("/admin/users/{}", user_id)).await
    }
}
