use std::sync::Arc;

use collegium_config::{
    CorsConfig, JwtConfig, RateLimitConfig, ServerConfig, StorageBackend, StorageConfig,
};
use collegium_core::ImageStorage;
use collegium_core::image_storage::{CloudinaryImageStorage, LocalImageStorage};
use sqlx::PgPool;

use crate::store::Repositories;
use crate::utils::image_cleanup::ImageCleanup;

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub image_storage: Arc<dyn ImageStorage>,
    pub image_cleanup: ImageCleanup,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub storage_config: StorageConfig,
    pub server_config: ServerConfig,
}

impl AppState {
    /// Assembles state around already-built repositories and image storage.
    pub fn new(
        repos: Repositories,
        image_storage: Arc<dyn ImageStorage>,
        jwt_config: JwtConfig,
        cors_config: CorsConfig,
        rate_limit_config: RateLimitConfig,
        storage_config: StorageConfig,
        server_config: ServerConfig,
    ) -> Self {
        let image_cleanup =
            ImageCleanup::new(image_storage.clone(), repos.pending_image_deletions.clone());
        Self {
            repos,
            image_storage,
            image_cleanup,
            jwt_config,
            cors_config,
            rate_limit_config,
            storage_config,
            server_config,
        }
    }
}

pub fn image_storage_from_config(config: &StorageConfig) -> Arc<dyn ImageStorage> {
    match &config.backend {
        StorageBackend::Cloudinary {
            cloud_name,
            api_key,
            api_secret,
        } => Arc::new(CloudinaryImageStorage::new(
            cloud_name.clone(),
            api_key.clone(),
            api_secret.clone(),
        )),
        StorageBackend::Local => Arc::new(LocalImageStorage::new(
            config.upload_dir.clone().into(),
            config.upload_base_url.clone(),
        )),
    }
}

/// Production state: Postgres repositories and configuration from the environment.
pub fn init_app_state(pool: PgPool) -> AppState {
    let storage_config = StorageConfig::from_env();
    AppState::new(
        Repositories::postgres(pool),
        image_storage_from_config(&storage_config),
        JwtConfig::from_env(),
        CorsConfig::from_env(),
        RateLimitConfig::from_env(),
        storage_config,
        ServerConfig::from_env(),
    )
}
