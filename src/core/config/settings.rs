use std::path::PathBuf;

use super::parsing::{
    env_flag, env_optional, env_or_default, normalize_prefix, parse_bool, parse_cors_origins,
    parse_environment, parse_store_backend, parse_u16, parse_u32, parse_u64,
};
use super::secret::{load_or_create_secret_key, secret_file_path};
use super::types::{
    AdminSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, RuntimeSettings,
    SecuritySettings, ServerHost, ServerPort, ServerSettings, Settings, StorageSettings,
    StoreBackend, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("TASKDESK_HOST", "0.0.0.0");
        let port = env_or_default("TASKDESK_PORT", "8000");

        let environment = parse_environment(
            env_optional("TASKDESK_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config =
            env_optional("TASKDESK_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Taskdesk API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_prefix = normalize_prefix(&env_or_default("API_PREFIX", "/api"));

        let (secret_key, secret_key_generated) = match env_optional("SECRET_KEY") {
            Some(value) => (value, false),
            None => {
                let path = secret_file_path(env_optional("SECRET_KEY_FILE"));
                (load_or_create_secret_key(&path), true)
            }
        };
        let access_token_expire_minutes = parse_u64(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "1440"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");
        let admin_enrollment_code = env_or_default("ADMIN_ENROLLMENT_CODE", "MOD");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let backend = parse_store_backend(env_optional("TASKDESK_STORE"))?;
        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "taskdesk");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "taskdesk");
        let database_url = env_optional("DATABASE_URL");
        let max_connections =
            parse_u32("DATABASE_MAX_CONNECTIONS", env_or_default("DATABASE_MAX_CONNECTIONS", "10"))?;

        let upload_dir = PathBuf::from(env_or_default("UPLOAD_DIR", "uploads"));
        let max_upload_size_mb =
            parse_u64("MAX_UPLOAD_SIZE_MB", env_or_default("MAX_UPLOAD_SIZE_MB", "10"))?;
        let require_upload_auth = env_flag("UPLOAD_REQUIRE_AUTH", true);

        let bootstrap_email = env_optional("BOOTSTRAP_ADMIN_EMAIL");
        let bootstrap_password = env_or_default("BOOTSTRAP_ADMIN_PASSWORD", "");
        let bootstrap_name = env_or_default("BOOTSTRAP_ADMIN_NAME", "Administrator");

        let log_level = env_or_default("TASKDESK_LOG_LEVEL", "info");
        let json = env_flag("TASKDESK_LOG_JSON", false);
        let prometheus_enabled = env_flag("PROMETHEUS_ENABLED", false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_prefix },
            security: SecuritySettings {
                secret_key,
                secret_key_generated,
                access_token_expire_minutes,
                algorithm,
                admin_enrollment_code,
            },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                backend,
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
                max_connections,
            },
            storage: StorageSettings { upload_dir, max_upload_size_mb, require_upload_auth },
            admin: AdminSettings { bootstrap_email, bootstrap_password, bootstrap_name },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;

        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.security.access_token_expire_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ACCESS_TOKEN_EXPIRE_MINUTES",
                value: "0".to_string(),
            });
        }

        if self.storage.max_upload_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAX_UPLOAD_SIZE_MB",
                value: "0".to_string(),
            });
        }

        if self.security.admin_enrollment_code.is_empty() {
            return Err(ConfigError::MissingSecret("ADMIN_ENROLLMENT_CODE"));
        }

        if !self.runtime.strict_config {
            return Ok(());
        }

        if self.security.secret_key_generated {
            return Err(ConfigError::MissingSecret("SECRET_KEY"));
        }

        if self.database.backend == StoreBackend::Postgres
            && self.database.database_url.is_none()
            && self.database.postgres_password.is_empty()
        {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }

        if self.admin.bootstrap_email.is_some() && self.admin.bootstrap_password.is_empty() {
            return Err(ConfigError::MissingSecret("BOOTSTRAP_ADMIN_PASSWORD"));
        }

        Ok(())
    }
}

impl DatabaseSettings {
    pub(crate) fn database_url(&self) -> String {
        if let Some(url) = &self.database_url {
            return url.clone();
        }
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.postgres_user,
            self.postgres_password,
            self.postgres_server,
            self.postgres_port,
            self.postgres_db
        )
    }
}

impl ServerHost {
    fn parse(value: String) -> Result<Self, ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::InvalidHost(value));
        }
        Ok(Self(value))
    }
}

impl ServerPort {
    fn parse(value: String) -> Result<Self, ConfigError> {
        let parsed: u16 = value.parse().map_err(|_| ConfigError::InvalidPort(value.clone()))?;
        if parsed == 0 {
            return Err(ConfigError::InvalidPort(value));
        }
        Ok(Self(parsed))
    }
}
