use std::env;

/// Application configuration, loaded from the environment with defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind host (default: "127.0.0.1")
    pub host: String,

    /// Bind port (default: 8080)
    pub port: u16,

    /// SeaORM database URL (default: "sqlite://photo_library.db?mode=rwc")
    pub database_url: String,

    /// Maximum upload size in bytes (default: 50 MB)
    pub max_file_size: usize,

    /// Accepted photo MIME types
    pub allowed_types: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "sqlite://photo_library.db?mode=rwc".to_string(),
            max_file_size: 50 * 1024 * 1024,
            allowed_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
                "image/tiff".to_string(),
                "image/bmp".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(default.host),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            allowed_types: env::var("ALLOWED_TYPES")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_types),
        }
    }

    pub fn is_allowed_type(&self, mime_type: &str) -> bool {
        let normalized = mime_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();
        self.allowed_types.iter().any(|t| t == &normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_file_size, 50 * 1024 * 1024);
        assert_eq!(config.port, 8080);
        assert!(config.allowed_types.contains(&"image/jpeg".to_string()));
    }

    #[test]
    fn test_allowed_type_normalization() {
        let config = Config::default();
        assert!(config.is_allowed_type("image/png"));
        assert!(config.is_allowed_type("IMAGE/PNG"));
        assert!(config.is_allowed_type("image/jpeg; charset=binary"));
        assert!(!config.is_allowed_type("application/pdf"));
    }
}
