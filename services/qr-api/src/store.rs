use crate::config::S3Config;
use crate::error::QrError;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Builder as S3ConfigBuilder, Credentials};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use aws_types::region::Region;
use tracing::{debug, info, instrument, warn};

/// Write-only view of the bucket used by the pipeline
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket all objects are written to
    fn bucket(&self) -> &str;

    /// Store `body` under `key`, overwriting any existing object
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str)
        -> Result<(), QrError>;

    /// Check the bucket exists and is reachable with the current credentials
    async fn probe(&self) -> Result<(), QrError>;
}

/// How the S3 client obtained its credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Access key pair from configuration
    Explicit,
    /// Default provider chain (IRSA, instance profile, shared config)
    Ambient,
}

impl AuthMethod {
    /// Label reported by the root endpoint
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Explicit => "Explicit Credentials",
            AuthMethod::Ambient => "IRSA",
        }
    }

    /// Label reported by the health endpoint
    pub fn short_label(&self) -> &'static str {
        match self {
            AuthMethod::Explicit => "Explicit",
            AuthMethod::Ambient => "IRSA",
        }
    }
}

/// S3-backed object store
pub struct S3Store {
    client: S3Client,
    bucket: String,
    auth_method: AuthMethod,
}

impl S3Store {
    /// Create the S3 client once, resolving credentials up front
    pub async fn new(config: &S3Config) -> anyhow::Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        let auth_method = match config.explicit_credentials() {
            Some((access_key, secret_key)) => {
                info!("Using explicit AWS credentials from environment");
                loader = loader.credentials_provider(Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    "qr-api-config",
                ));
                AuthMethod::Explicit
            }
            None => {
                if config.access_key_id.is_some() || config.secret_access_key.is_some() {
                    warn!("Incomplete AWS credential pair configured, falling back to IAM role");
                }
                info!("Using IAM role for authentication (IRSA or instance profile)");
                AuthMethod::Ambient
            }
        };

        let aws_config = loader.load().await;
        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        // Configure custom endpoint for MinIO/LocalStack
        if let Some(ref endpoint_url) = config.endpoint_url {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }

        // Force path-style access for MinIO compatibility
        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let client = S3Client::from_conf(s3_config_builder.build());

        info!(
            bucket = %config.bucket,
            region = %config.region,
            auth_method = auth_method.as_str(),
            "S3 store initialized"
        );

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            auth_method,
        })
    }

    pub fn auth_method(&self) -> AuthMethod {
        self.auth_method
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    #[instrument(skip(self, body), fields(bucket = %self.bucket, size_bytes = body.len()))]
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), QrError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| QrError::Storage(DisplayErrorContext(&e).to_string()))?;

        debug!(key = %key, "Object written");
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn probe(&self) -> Result<(), QrError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| QrError::Storage(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}

/// Virtual-hosted-style URL for an object: https://{bucket}.{domain}/{key}
///
/// This is a string template only. It resolves to the object when the
/// bucket allows public reads, which is never checked.
pub fn public_url(bucket: &str, domain: &str, key: &str) -> String {
    format!("https://{bucket}.{domain}/{key}")
}
