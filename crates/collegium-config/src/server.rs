use crate::env_or;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds between retries of failed remote image deletions.
    pub image_reconcile_interval_secs: u64,
    /// Pending deletions retried per reconciliation pass.
    pub image_reconcile_batch_size: i64,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0".to_string()),
            port: env_or("PORT", 5002),
            image_reconcile_interval_secs: env_or("IMAGE_RECONCILE_INTERVAL_SECS", 300),
            image_reconcile_batch_size: env_or("IMAGE_RECONCILE_BATCH_SIZE", 50),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
