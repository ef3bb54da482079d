use serde::Deserialize;
use std::time::Duration;

/// Main configuration for the QR code service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,
    /// S3 configuration
    pub s3: S3Config,
    /// API configuration
    pub api: ApiConfig,
    /// QR rendering configuration
    #[serde(default)]
    pub qr: QrConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging and health responses
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Version reported by the root endpoint
    #[serde(default = "default_version")]
    pub version: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Metrics port, 0 disables the exporter
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// S3 storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    /// S3 bucket name for QR images
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint URL (for MinIO, LocalStack, etc.)
    pub endpoint_url: Option<String>,
    /// Force path-style access (required for MinIO)
    #[serde(default)]
    pub force_path_style: bool,
    /// Explicit access key; ambient credentials are used when absent
    pub access_key_id: Option<String>,
    /// Explicit secret key paired with `access_key_id`
    pub secret_access_key: Option<String>,
    /// Domain used to build public object URLs
    #[serde(default = "default_public_domain")]
    pub public_domain: String,
    /// How long a bucket probe result is reused by the health endpoint
    #[serde(default = "default_health_probe_ttl_secs")]
    pub health_probe_ttl_secs: u64,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API listen address
    #[serde(default = "default_api_host")]
    pub host: String,
    /// API listen port
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Allowed CORS origins (empty = any)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// QR error-correction level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum ErrorCorrection {
    /// ~7% recovery
    #[default]
    #[serde(alias = "l")]
    L,
    /// ~15% recovery
    #[serde(alias = "m")]
    M,
    /// ~25% recovery
    #[serde(alias = "q")]
    Q,
    /// ~30% recovery
    #[serde(alias = "h")]
    H,
}

/// QR rendering configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QrConfig {
    #[serde(default)]
    pub error_correction: ErrorCorrection,
    /// Pixels per module
    #[serde(default = "default_box_size")]
    pub box_size: u32,
    /// Quiet zone width in modules
    #[serde(default = "default_border")]
    pub border: u32,
}

// Default value functions
fn default_service_name() -> String {
    "qr-code-api".to_string()
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_bucket() -> String {
    "YOUR_BUCKET_NAME".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_public_domain() -> String {
    "s3.amazonaws.com".to_string()
}

fn default_health_probe_ttl_secs() -> u64 {
    30
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

fn default_box_size() -> u32 {
    10
}

fn default_border() -> u32 {
    4
}

impl Config {
    /// Load configuration from config files and the process environment
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration, reading the conventional AWS/bucket variables through `lookup`
    pub fn load_with<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(key))
                .find(|value| !value.is_empty())
        };

        let config = config::Config::builder()
            // Start with default values
            .set_default("service.name", default_service_name())?
            .set_default("service.log_level", default_log_level())?
            .set_default("service.metrics_port", default_metrics_port())?
            .set_default("s3.bucket", default_bucket())?
            .set_default("s3.region", default_region())?
            .set_default("api.port", default_api_port())?
            // Add config file if present
            .add_source(config::File::with_name("config/qr-api").required(false))
            .add_source(config::File::with_name("/etc/qr-api/qr-api").required(false))
            // QR_API__API__PORT -> api.port
            .add_source(
                config::Environment::with_prefix("QR_API")
                    .separator("__")
                    .try_parsing(true),
            )
            // Conventional deployment variables win over everything else
            .set_override_option("s3.bucket", env(&["BUCKET_NAME"]))?
            .set_override_option("s3.region", env(&["AWS_REGION"]))?
            .set_override_option(
                "s3.access_key_id",
                env(&["AWS_ACCESS_KEY_ID", "AWS_ACCESS_KEY"]),
            )?
            .set_override_option(
                "s3.secret_access_key",
                env(&["AWS_SECRET_ACCESS_KEY", "AWS_SECRET_KEY"]),
            )?
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.s3.bucket.trim().is_empty() {
            anyhow::bail!("s3.bucket must not be empty");
        }
        if self.qr.box_size == 0 {
            anyhow::bail!("qr.box_size must be at least 1");
        }
        Ok(())
    }

    /// Get the health probe cache lifetime as Duration
    pub fn health_probe_ttl(&self) -> Duration {
        Duration::from_secs(self.s3.health_probe_ttl_secs)
    }
}

impl S3Config {
    /// Explicit credential pair, if both halves are configured
    pub fn explicit_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some((key.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_version(),
            log_level: default_log_level(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            region: default_region(),
            endpoint_url: None,
            force_path_style: false,
            access_key_id: None,
            secret_access_key: None,
            public_domain: default_public_domain(),
            health_probe_ttl_secs: default_health_probe_ttl_secs(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            error_correction: ErrorCorrection::L,
            box_size: default_box_size(),
            border: default_border(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::load_with(|key| vars.get(key).cloned()).unwrap()
    }

    #[test]
    fn test_default_values() {
        let config = load_from(&[]);
        assert_eq!(config.s3.bucket, "YOUR_BUCKET_NAME");
        assert_eq!(config.s3.region, "us-east-1");
        assert_eq!(config.s3.public_domain, "s3.amazonaws.com");
        assert_eq!(config.api.port, 8000);
        assert_eq!(config.qr.error_correction, ErrorCorrection::L);
        assert_eq!(config.qr.box_size, 10);
        assert_eq!(config.qr.border, 4);
        assert!(config.s3.explicit_credentials().is_none());
    }

    #[test]
    fn test_conventional_env_overrides() {
        let config = load_from(&[
            ("BUCKET_NAME", "qr-bucket"),
            ("AWS_REGION", "eu-west-1"),
            ("AWS_ACCESS_KEY", "AKIDEXAMPLE"),
            ("AWS_SECRET_KEY", "secret"),
        ]);
        assert_eq!(config.s3.bucket, "qr-bucket");
        assert_eq!(config.s3.region, "eu-west-1");
        assert_eq!(
            config.s3.explicit_credentials(),
            Some(("AKIDEXAMPLE", "secret"))
        );
    }

    #[test]
    fn test_primary_credential_names_take_precedence() {
        let config = load_from(&[
            ("AWS_ACCESS_KEY_ID", "primary"),
            ("AWS_ACCESS_KEY", "fallback"),
            ("AWS_SECRET_ACCESS_KEY", "primary-secret"),
        ]);
        assert_eq!(
            config.s3.explicit_credentials(),
            Some(("primary", "primary-secret"))
        );
    }

    #[test]
    fn test_half_credential_pair_is_ambient() {
        let config = load_from(&[("AWS_ACCESS_KEY_ID", "only-key")]);
        assert!(config.s3.explicit_credentials().is_none());
    }

    #[test]
    fn test_dotenv_file_feeds_conventional_variables() {
        let path = std::env::temp_dir().join(format!("qr-api-{}.env", std::process::id()));
        std::fs::write(
            &path,
            "BUCKET_NAME=qr-bucket\nAWS_REGION=eu-central-1\nAWS_ACCESS_KEY=AKIDEXAMPLE\nAWS_SECRET_KEY=secret\n",
        )
        .unwrap();

        let vars: HashMap<String, String> = dotenvy::from_path_iter(&path)
            .unwrap()
            .map(|item| item.unwrap())
            .collect();
        std::fs::remove_file(&path).unwrap();

        let config = Config::load_with(|key| vars.get(key).cloned()).unwrap();
        assert_eq!(config.s3.bucket, "qr-bucket");
        assert_eq!(config.s3.region, "eu-central-1");
        assert_eq!(
            config.s3.explicit_credentials(),
            Some(("AKIDEXAMPLE", "secret"))
        );
    }

    #[test]
    fn test_validate_rejects_empty_bucket() {
        let config = Config {
            service: ServiceConfig::default(),
            s3: S3Config {
                bucket: "  ".to_string(),
                ..Default::default()
            },
            api: ApiConfig::default(),
            qr: QrConfig::default(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_health_probe_ttl() {
        let config = load_from(&[]);
        assert_eq!(config.health_probe_ttl(), Duration::from_secs(30));
    }
}
