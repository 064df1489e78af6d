use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Admin => "ROLE_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ROLE_USER" | "USER" => Ok(Role::User),
            "ROLE_ADMIN" | "ADMIN" => Ok(Role::Admin),
            other => Err(format!("Rol desconocido: {}", other)),
        }
    }
}

/// Foot arch classification attached to every foot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArchType {
    PesPlanus,
    #[default]
    PesRectus,
    PesCavus,
}

impl ArchType {
    pub const ALL: [ArchType; 3] = [ArchType::PesPlanus, ArchType::PesRectus, ArchType::PesCavus];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchType::PesPlanus => "PES_PLANUS",
            ArchType::PesRectus => "PES_RECTUS",
            ArchType::PesCavus => "PES_CAVUS",
        }
    }

    /// Human label shown on the detail page.
    pub fn label(&self) -> &'static str {
        match self {
            ArchType::PesPlanus => "Flatland Enthusiast",
            ArchType::PesRectus => "Basic Arch",
            ArchType::PesCavus => "Bridge Architect",
        }
    }
}

impl fmt::Display for ArchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArchType::ALL
            .into_iter()
            .find(|arch| arch.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Tipo de arco desconocido: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Foot {
    pub id: i64,
    pub title: String,
    pub image_url: String,
    pub arch_type: ArchType,
    pub owner_username: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub comment: String,
    pub rate_aspect: u8,
    pub review_username: String,
    pub created_at: String,
}

impl Review {
    /// Rating as shown next to the comment.
    pub fn stars(&self) -> String {
        format!("⭐ {}/5", self.rate_aspect)
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }
}

/// A review tagged with the foot it was fetched from.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedReview {
    pub foot_id: i64,
    pub review: Review,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

/// Spring-style page envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub number: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwipeAction {
    Like,
    Dislike,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Swipe {
    pub foot_id: i64,
    pub action: SwipeAction,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinigameLibrary {
    pub folders: Vec<String>,
    pub selected_folder: Option<String>,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
}

// Request bodies

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFoot {
    pub title: String,
    pub image_url: String,
    pub arch_type: ArchType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub rate_aspect: u8,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminUserUpdate {
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwipeRequest {
    pub action: SwipeAction,
}

/// Parse a backend timestamp. Accepts RFC 3339 and zone-less ISO-8601
/// (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foot_deserializes_from_camel_case() {
        let json = r#"{
            "id": 7,
            "title": "Arco alto",
            "imageUrl": "/images/feet/a.png",
            "archType": "PES_CAVUS",
            "ownerUsername": "ana",
            "createdAt": "2024-05-01T10:00:00"
        }"#;
        let foot: Foot = serde_json::from_str(json).unwrap();
        assert_eq!(foot.id, 7);
        assert_eq!(foot.arch_type, ArchType::PesCavus);
        assert_eq!(foot.owner_username, "ana");
    }

    #[test]
    fn arch_type_labels() {
        assert_eq!(ArchType::PesPlanus.label(), "Flatland Enthusiast");
        assert_eq!(ArchType::PesRectus.label(), "Basic Arch");
        assert_eq!(ArchType::PesCavus.label(), "Bridge Architect");
        assert_eq!(ArchType::default(), ArchType::PesRectus);
    }

    #[test]
    fn arch_type_parses_case_insensitively() {
        assert_eq!("pes_planus".parse::<ArchType>().unwrap(), ArchType::PesPlanus);
        assert!("flat".parse::<ArchType>().is_err());
    }

    #[test]
    fn role_round_trips_backend_names() {
        let user: CurrentUser =
            serde_json::from_str(r#"{"id":1,"username":"root","role":"ROLE_ADMIN"}"#).unwrap();
        assert!(user.is_admin());
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"ROLE_USER\"");
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    }

    #[test]
    fn page_response_tolerates_missing_counters() {
        let page: PageResponse<AdminUser> = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert_eq!(page.total_pages, 0);
        assert!(page.content.is_empty());
    }

    #[test]
    fn auth_response_without_token() {
        let auth: AuthResponse = serde_json::from_str("{}").unwrap();
        assert!(auth.token.is_none());
    }

    #[test]
    fn parse_timestamp_accepts_both_formats() {
        let zoned = parse_timestamp("2024-05-01T10:00:00Z").unwrap();
        let naive = parse_timestamp("2024-05-01T10:00:00.000").unwrap();
        assert_eq!(zoned, naive);
        assert!(parse_timestamp("ayer").is_none());
    }

    #[test]
    fn new_foot_serializes_camel_case() {
        let body = NewFoot {
            title: "Pie".into(),
            image_url: "data:image/png;base64,AAAA".into(),
            arch_type: ArchType::PesPlanus,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["imageUrl"], "data:image/png;base64,AAAA");
        assert_eq!(json["archType"], "PES_PLANUS");
    }
}
