use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::media::MediaLibrary;
use crate::store::FlatFileStore;

/// Everything a handler needs, built once at startup from the configuration.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<FlatFileStore>,
    pub media: Arc<MediaLibrary>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = Arc::new(FlatFileStore::new(config.storage.data_dir.clone()));
        let media = Arc::new(MediaLibrary::new(
            config.storage.uploads_dir.clone(),
            config.public_url(),
            store.clone(),
        ));
        let tokens = Arc::new(TokenService::new(&config.security));

        Self {
            config: Arc::new(config),
            store,
            media,
            tokens,
        }
    }

    /// Create the data and uploads directories.
    pub async fn prepare_storage(&self) -> anyhow::Result<()> {
        self.store.ensure_root().await?;
        self.media.ensure_dir().await?;
        Ok(())
    }
}
