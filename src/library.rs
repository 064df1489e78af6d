//! Folder-backed image library for the minigame, served at
//! `/api/minigame/library`.

use std::path::Path;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::MinigameLibrary;
use crate::state::AppState;

const IMAGES_DIR: &str = "images";
const PREFERRED_FOLDER: &str = "images/feet";
const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "webp", "gif", "avif"];

#[derive(Debug, Default, Deserialize)]
pub struct LibraryQuery {
    pub folder: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/minigame/library", get(library))
}

async fn library(
    State(state): State<AppState>,
    Query(query): Query<LibraryQuery>,
) -> AppResult<Json<MinigameLibrary>> {
    let public_dir = state.public_dir.clone();
    let listing = scan(&public_dir, query.folder.as_deref()).await?;
    tracing::debug!(
        "Library {:?}: {} images",
        listing.selected_folder,
        listing.images.len()
    );
    Ok(Json(listing))
}

/// List `<public_dir>/images/*` and the images of the selected folder.
///
/// The requested folder wins when it exists, then `images/feet`, then the
/// first folder alphabetically.
pub async fn scan(public_dir: &Path, requested: Option<&str>) -> std::io::Result<MinigameLibrary> {
    let mut folders = Vec::new();
    let mut entries = tokio::fs::read_dir(public_dir.join(IMAGES_DIR)).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            folders.push(format!("{}/{}", IMAGES_DIR, entry.file_name().to_string_lossy()));
        }
    }
    folders.sort();

    let selected = match requested {
        Some(folder) if folders.iter().any(|f| f == folder) => folder.to_string(),
        _ if folders.iter().any(|f| f == PREFERRED_FOLDER) => PREFERRED_FOLDER.to_string(),
        _ => match folders.first() {
            Some(first) => first.clone(),
            None => return Ok(MinigameLibrary::default()),
        },
    };

    let mut names = Vec::new();
    let mut files = tokio::fs::read_dir(public_dir.join(&selected)).await?;
    while let Some(entry) = files.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_image(&name) {
            names.push(name);
        }
    }
    names.sort();

    let images = names
        .into_iter()
        .map(|name| format!("/{}/{}", selected, name))
        .collect();

    Ok(MinigameLibrary {
        folders,
        selected_folder: Some(selected),
        images,
    })
}

fn is_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}
