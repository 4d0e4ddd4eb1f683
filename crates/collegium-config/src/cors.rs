/// Admin dashboard and public site dev servers.
const DEFAULT_ORIGINS: &str = "http://localhost:5173,http://localhost:5174";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorsConfig {
    /// Origins allowed to send credentialed requests (the auth cookie).
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    /// Reads the comma separated `ALLOWED_ORIGINS`.
    pub fn from_env() -> Self {
        let raw = std::env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ORIGINS.to_string());
        Self::from_list(&raw)
    }

    pub fn from_list(raw: &str) -> Self {
        let allowed_origins = raw
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        Self { allowed_origins }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_list_trims_entries() {
        let config = CorsConfig::from_list(" https://collegium.edu/ ,,http://localhost:5173");
        assert_eq!(
            config.allowed_origins,
            vec!["https://collegium.edu", "http://localhost:5173"]
        );
    }

    #[test]
    fn test_default_origins() {
        let config = CorsConfig::from_list(DEFAULT_ORIGINS);
        assert_eq!(config.allowed_origins.len(), 2);
    }
}
