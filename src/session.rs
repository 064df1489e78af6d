use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::storage::LocalStorage;

/// A cookie as written by the client, mirroring `document.cookie` attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub max_age: i64,
    pub same_site: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredCookie {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Render in `Set-Cookie` form.
    pub fn header(&self) -> String {
        format!(
            "{}={}; path={}; max-age={}; samesite={}",
            self.name, self.value, self.path, self.max_age, self.same_site
        )
    }
}

/// Cookie jar persisted next to local storage (`cookies.json`).
#[derive(Clone, Debug)]
pub struct CookieJar {
    store: LocalStorage,
}

impl CookieJar {
    pub const FILE_NAME: &'static str = "cookies.json";
    /// Longest lifetime a cookie is given (400 days, as browsers cap it).
    pub const MAX_AGE: i64 = 400 * 24 * 3600;

    pub fn in_memory() -> Self {
        Self {
            store: LocalStorage::in_memory(),
        }
    }

    pub fn open(data_dir: &Path) -> std::io::Result<Self> {
        Ok(Self {
            store: LocalStorage::open_file(data_dir.join(Self::FILE_NAME))?,
        })
    }

    /// Write a cookie. A non-positive max-age deletes it, as browsers do.
    pub fn set(&self, name: &str, value: &str, max_age: i64) -> std::io::Result<()> {
        if max_age <= 0 {
            return self.store.remove(name);
        }
        let max_age = max_age.min(Self::MAX_AGE);

        let cookie = StoredCookie {
            name: name.to_string(),
            value: value.to_string(),
            path: "/".to_string(),
            max_age,
            same_site: "lax".to_string(),
            expires_at: Utc::now() + Duration::seconds(max_age),
        };
        self.store.set(name, &serde_json::to_string(&cookie)?)
    }

    pub fn get(&self, name: &str) -> Option<StoredCookie> {
        self.get_at(name, Utc::now())
    }

    pub fn get_at(&self, name: &str, now: DateTime<Utc>) -> Option<StoredCookie> {
        let raw = self.store.get(name)?;
        let cookie: StoredCookie = serde_json::from_str(&raw).ok()?;
        if cookie.is_expired(now) {
            None
        } else {
            Some(cookie)
        }
    }
}

/// Single write path for the session token.
///
/// The token lives in local storage (read by the client) and in a cookie
/// (read by middleware only). Both share the server session lifetime.
#[derive(Clone, Debug)]
pub struct SessionStore {
    storage: LocalStorage,
    cookies: CookieJar,
    token_key: String,
    cookie_name: String,
    max_age_secs: i64,
}

impl SessionStore {
    pub fn new(storage: LocalStorage, cookies: CookieJar, config: &SessionConfig) -> Self {
        Self {
            storage,
            cookies,
            token_key: config.token_key.clone(),
            cookie_name: config.cookie_name.clone(),
            max_age_secs: i64::try_from(config.max_age_hours)
                .ok()
                .and_then(|hours| hours.checked_mul(3600))
                .map_or(CookieJar::MAX_AGE, |secs| secs.min(CookieJar::MAX_AGE)),
        }
    }

    pub fn open(data_dir: &Path, config: &SessionConfig) -> std::io::Result<Self> {
        Ok(Self::new(
            LocalStorage::open(data_dir)?,
            CookieJar::open(data_dir)?,
            config,
        ))
    }

    pub fn in_memory() -> Self {
        Self::new(
            LocalStorage::in_memory(),
            CookieJar::in_memory(),
            &SessionConfig::default(),
        )
    }

    pub fn save_token(&self, token: &str) -> std::io::Result<()> {
        self.storage.set(&self.token_key, token)?;
        let encoded: String = url::form_urlencoded::byte_serialize(token.as_bytes()).collect();
        self.cookies
            .set(&self.cookie_name, &encoded, self.max_age_secs)?;
        tracing::info!("Session token saved");
        Ok(())
    }

    /// Read the token from local storage. The cookie is never read back.
    pub fn token(&self) -> Option<String> {
        self.storage.get(&self.token_key).filter(|t| !t.is_empty())
    }

    pub fn clear_token(&self) -> std::io::Result<()> {
        self.storage.remove(&self.token_key)?;
        self.cookies.set(&self.cookie_name, "", 0)?;
        tracing::info!("Session token cleared");
        Ok(())
    }

    pub fn cookie(&self) -> Option<StoredCookie> {
        self.cookies.get(&self.cookie_name)
    }

    /// Local storage shared with other client-side state.
    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_writes_storage_and_cookie() {
        let session = SessionStore::in_memory();
        session.save_token("tok-123").unwrap();

        assert_eq!(session.token().as_deref(), Some("tok-123"));
        let cookie = session.cookie().expect("cookie written");
        assert_eq!(cookie.name, "token");
        assert_eq!(cookie.value, "tok-123");
        assert_eq!(cookie.max_age, 43_200);
        assert_eq!(
            cookie.header(),
            "token=tok-123; path=/; max-age=43200; samesite=lax"
        );
    }

    #[test]
    fn cookie_value_is_url_encoded() {
        let session = SessionStore::in_memory();
        session.save_token("a/b=c").unwrap();
        assert_eq!(session.cookie().unwrap().value, "a%2Fb%3Dc");
        assert_eq!(session.token().as_deref(), Some("a/b=c"));
    }

    #[test]
    fn clear_removes_both_locations() {
        let session = SessionStore::in_memory();
        session.save_token("tok").unwrap();
        session.clear_token().unwrap();

        assert!(session.token().is_none());
        assert!(session.cookie().is_none());
    }

    #[test]
    fn cookie_expires_after_max_age() {
        let jar = CookieJar::in_memory();
        jar.set("token", "x", 60).unwrap();
        let later = Utc::now() + Duration::seconds(61);
        assert!(jar.get_at("token", later).is_none());
        assert!(jar.get("token").is_some());
    }

    #[test]
    fn huge_max_age_is_capped() {
        let config = SessionConfig {
            max_age_hours: u64::MAX,
            ..SessionConfig::default()
        };
        let session = SessionStore::new(LocalStorage::in_memory(), CookieJar::in_memory(), &config);
        session.save_token("tok").unwrap();
        assert_eq!(session.cookie().unwrap().max_age, CookieJar::MAX_AGE);

        let jar = CookieJar::in_memory();
        jar.set("token", "x", i64::MAX).unwrap();
        assert_eq!(jar.get("token").unwrap().max_age, CookieJar::MAX_AGE);
    }

    #[test]
    fn session_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let config = SessionConfig::default();
        SessionStore::open(tmp.path(), &config)
            .unwrap()
            .save_token("persisted")
            .unwrap();

        let reopened = SessionStore::open(tmp.path(), &config).unwrap();
        assert_eq!(reopened.token().as_deref(), Some("persisted"));
        assert!(reopened.cookie().is_some());
    }
}
