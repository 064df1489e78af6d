use std::path::PathBuf;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    /// Root of the public assets; the library lives under `images/`.
    pub public_dir: PathBuf,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            public_dir: config.public_dir(),
        }
    }
}
