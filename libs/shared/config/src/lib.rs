use std::env;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Supabase,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    pub storage_backend: StorageBackend,
    pub default_service_duration_minutes: i32,
    pub api_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            storage_backend: StorageBackend::Memory,
            default_service_duration_minutes: env::var("DEFAULT_SERVICE_DURATION_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|minutes: &i32| *minutes > 0)
                .unwrap_or_else(|| {
                    warn!("DEFAULT_SERVICE_DURATION_MINUTES not set or invalid, using 30");
                    30
                }),
            api_port: env::var("API_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
        };

        config.storage_backend = match env::var("STORAGE_BACKEND").as_deref() {
            Ok("supabase") => StorageBackend::Supabase,
            Ok("memory") => StorageBackend::Memory,
            Ok(other) => {
                warn!("Unknown STORAGE_BACKEND '{}', falling back to detection", other);
                config.detect_backend()
            }
            Err(_) => config.detect_backend(),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    /// Key used for server-side PostgREST calls; the engine trusts its callers
    /// so it does not forward end-user tokens.
    pub fn database_key(&self) -> &str {
        if self.supabase_service_role_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_role_key
        }
    }

    fn detect_backend(&self) -> StorageBackend {
        if self.is_configured() {
            StorageBackend::Supabase
        } else {
            StorageBackend::Memory
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_service_role_key: String::new(),
            supabase_jwt_secret: String::new(),
            storage_backend: StorageBackend::Memory,
            default_service_duration_minutes: 30,
            api_port: 3000,
        }
    }
}
