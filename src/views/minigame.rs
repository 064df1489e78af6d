use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::models::SwipeAction;
use crate::storage::LocalStorage;
use crate::views::PageStatus;

const TALLY_KEY_PREFIX: &str = "solemate_minigame_";
const TALLY_WINDOW_HOURS: i64 = 24;

/// Like/dislike counters kept in local storage, per user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeTally {
    pub likes: u32,
    pub dislikes: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SwipeTally {
    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.updated_at
            .is_some_and(|at| now >= at + Duration::hours(TALLY_WINDOW_HOURS))
    }
}

/// Rolling 24h tally store. Every write moves the window forward.
#[derive(Clone, Debug)]
pub struct TallyStore {
    storage: LocalStorage,
}

impl TallyStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    fn key(username: &str) -> String {
        format!("{}{}", TALLY_KEY_PREFIX, username)
    }

    /// Read `username`'s tally; one older than the window reads as zero and
    /// is dropped.
    pub fn load(&self, username: &str, now: DateTime<Utc>) -> SwipeTally {
        let key = Self::key(username);
        let Some(raw) = self.storage.get(&key) else {
            return SwipeTally::default();
        };
        let tally: SwipeTally = match serde_json::from_str(&raw) {
            Ok(tally) => tally,
            Err(e) => {
                tracing::warn!("Discarding unreadable minigame tally for {}: {}", username, e);
                return SwipeTally::default();
            }
        };

        if tally.is_stale(now) {
            tracing::debug!("Minigame tally for {} expired", username);
            if let Err(e) = self.storage.remove(&key) {
                tracing::warn!("Could not reset minigame tally: {}", e);
            }
            return SwipeTally::default();
        }
        tally
    }

    pub fn save(&self, username: &str, tally: &SwipeTally) -> std::io::Result<()> {
        self.storage
            .set(&Self::key(username), &serde_json::to_string(tally)?)
    }
}

/// Controller for `/feet/game`.
pub struct MinigamePage {
    client: ApiClient,
    tallies: TallyStore,
    shuffle: bool,
    pub status: PageStatus,
    pub username: Option<String>,
    pub folders: Vec<String>,
    pub selected_folder: Option<String>,
    pub images: Vec<String>,
    pub index: usize,
    /// Counters of the current run.
    pub likes: u32,
    pub dislikes: u32,
    /// Persisted counters for the rolling window.
    pub totals: SwipeTally,
}

impl MinigamePage {
    pub fn new(client: ApiClient, shuffle: bool) -> Self {
        let tallies = TallyStore::new(client.session().storage().clone());
        Self {
            client,
            tallies,
            shuffle,
            status: PageStatus::Idle,
            username: None,
            folders: Vec::new(),
            selected_folder: None,
            images: Vec::new(),
            index: 0,
            likes: 0,
            dislikes: 0,
            totals: SwipeTally::default(),
        }
    }

    pub async fn load(&mut self, folder: Option<&str>) {
        self.load_at(folder, Utc::now()).await
    }

    /// Verify the session, then load the image library.
    pub async fn load_at(&mut self, folder: Option<&str>, now: DateTime<Utc>) {
        self.status = PageStatus::Loading;

        let me = match self.client.current_user().await {
            Ok(me) => me,
            Err(err) => {
                self.status = PageStatus::Errored(err.user_message());
                return;
            }
        };
        self.totals = self.tallies.load(&me.username, now);
        self.username = Some(me.username);

        match self.client.minigame_library(folder).await {
            Ok(library) => {
                let mut images = library.images;
                if self.shuffle {
                    images.shuffle(&mut rand::thread_rng());
                }
                self.folders = library.folders;
                self.selected_folder = library.selected_folder;
                self.images = images;
                self.restart();
                self.status = PageStatus::Ready;
            }
            Err(err) => self.status = PageStatus::Errored(err.user_message()),
        }
    }

    pub fn total(&self) -> usize {
        self.images.len()
    }

    pub fn current_image(&self) -> Option<&str> {
        self.images.get(self.index).map(String::as_str)
    }

    pub fn finished(&self) -> bool {
        self.total() > 0 && self.index >= self.total()
    }

    pub fn progress_label(&self) -> String {
        let total = self.total();
        if total == 0 {
            return "0/0".to_string();
        }
        format!("{}/{}", (self.index + 1).min(total), total)
    }

    pub fn swipe(&mut self, action: SwipeAction) -> bool {
        self.swipe_at(action, Utc::now())
    }

    /// Count the swipe and advance. Ignored once every image was shown.
    pub fn swipe_at(&mut self, action: SwipeAction, now: DateTime<Utc>) -> bool {
        if self.current_image().is_none() {
            return false;
        }

        match action {
            SwipeAction::Like => self.likes += 1,
            SwipeAction::Dislike => self.dislikes += 1,
        }
        self.index += 1;

        if let Some(username) = &self.username {
            let mut totals = self.tallies.load(username, now);
            match action {
                SwipeAction::Like => totals.likes += 1,
                SwipeAction::Dislike => totals.dislikes += 1,
            }
            totals.updated_at = Some(now);
            if let Err(e) = self.tallies.save(username, &totals) {
                tracing::warn!("Could not persist minigame tally: {}", e);
            }
            self.totals = totals;
        }
        true
    }

    /// Play the same images again; persisted totals are kept.
    pub fn restart(&mut self) {
        self.index = 0;
        self.likes = 0;
        self.dislikes = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::Navigator;
    use crate::session::SessionStore;

    fn page_with_images(images: &[&str]) -> MinigamePage {
        let client = ApiClient::new(
            "http://127.0.0.1:9",
            "http://127.0.0.1:9",
            SessionStore::in_memory(),
            Navigator::new("/feet/game"),
        );
        let mut page = MinigamePage::new(client, false);
        page.images = images.iter().map(|s| s.to_string()).collect();
        page.username = Some("ana".into());
        page
    }

    #[test]
    fn tally_resets_after_window() {
        let store = TallyStore::new(LocalStorage::in_memory());
        let t0 = Utc::now();
        let tally = SwipeTally {
            likes: 3,
            dislikes: 1,
            updated_at: Some(t0),
        };
        store.save("ana", &tally).unwrap();

        assert_eq!(store.load("ana", t0 + Duration::hours(23)), tally);
        assert_eq!(
            store.load("ana", t0 + Duration::hours(24)),
            SwipeTally::default()
        );
        // Stays reset once observed.
        assert_eq!(store.load("ana", t0), SwipeTally::default());
    }

    #[test]
    fn tallies_are_per_user() {
        let store = TallyStore::new(LocalStorage::in_memory());
        let now = Utc::now();
        store
            .save(
                "ana",
                &SwipeTally {
                    likes: 2,
                    dislikes: 0,
                    updated_at: Some(now),
                },
            )
            .unwrap();
        assert_eq!(store.load("luis", now), SwipeTally::default());
        assert_eq!(store.load("ana", now).likes, 2);
    }

    #[test]
    fn swipes_advance_and_finish() {
        let mut page = page_with_images(&["/images/feet/a.png", "/images/feet/b.png"]);
        assert_eq!(page.progress_label(), "1/2");

        assert!(page.swipe(SwipeAction::Like));
        assert_eq!(page.progress_label(), "2/2");
        assert!(page.swipe(SwipeAction::Dislike));
        assert!(page.finished());
        assert_eq!(page.progress_label(), "2/2");
        assert!(!page.swipe(SwipeAction::Like));

        assert_eq!((page.likes, page.dislikes), (1, 1));
        assert_eq!((page.totals.likes, page.totals.dislikes), (1, 1));

        page.restart();
        assert_eq!(page.index, 0);
        assert_eq!(page.likes, 0);
        assert_eq!(page.totals.likes, 1);
    }

    #[test]
    fn rolling_window_moves_with_each_swipe() {
        let mut page = page_with_images(&["a", "b", "c"]);
        let t0 = Utc::now();
        page.swipe_at(SwipeAction::Like, t0);
        page.swipe_at(SwipeAction::Like, t0 + Duration::hours(20));
        page.swipe_at(SwipeAction::Dislike, t0 + Duration::hours(30));
        assert_eq!((page.totals.likes, page.totals.dislikes), (2, 1));

        let later = t0 + Duration::hours(55);
        assert_eq!(page.tallies.load("ana", later), SwipeTally::default());
    }

    #[test]
    fn empty_library_progress() {
        let page = page_with_images(&[]);
        assert_eq!(page.progress_label(), "0/0");
        assert!(!page.finished());
        assert!(page.current_image().is_none());
    }
}
