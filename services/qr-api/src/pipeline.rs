use crate::encoder::QrEncoder;
use crate::error::QrError;
use crate::naming::artifact_key;
use crate::store::{public_url, ObjectStore};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use url::Url;

const PNG_CONTENT_TYPE: &str = "image/png";

/// Result of a successful generate call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub success: bool,
    /// Public URL of the stored image
    pub qr_code_url: String,
    /// Normalized input URL encoded in the image
    pub original_url: String,
    /// Object key in the bucket
    pub file_name: String,
}

/// Parse `raw` as an absolute http(s) URL with a host
pub fn validate_url(raw: &str) -> Result<Url, QrError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(QrError::Validation("URL must not be empty".to_string()));
    }

    let url =
        Url::parse(trimmed).map_err(|e| QrError::Validation(format!("'{trimmed}': {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(QrError::Validation(format!(
                "'{trimmed}': unsupported URL scheme '{scheme}'"
            )))
        }
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(QrError::Validation(format!("'{trimmed}': URL has no host"))),
    }
}

/// Validate, encode, name, upload, respond
///
/// Stateless between calls. The store is injected once and only ever used
/// for independent writes.
pub struct QrPipeline {
    store: Arc<dyn ObjectStore>,
    encoder: QrEncoder,
    public_domain: String,
}

impl QrPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        encoder: QrEncoder,
        public_domain: impl Into<String>,
    ) -> Self {
        Self {
            store,
            encoder,
            public_domain: public_domain.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        self.store.bucket()
    }

    /// Generate a QR code for `raw_url` and upload it
    #[instrument(skip(self))]
    pub async fn generate(&self, raw_url: &str) -> Result<UploadResult, QrError> {
        let result = self.run(raw_url).await;

        match &result {
            Ok(upload) => {
                metrics::counter!("qr.generated").increment(1);
                info!(file_name = %upload.file_name, "Successfully uploaded QR code to S3");
            }
            Err(e) => {
                metrics::counter!("qr.failed", "kind" => e.kind()).increment(1);
                warn!(error = %e, kind = e.kind(), "QR code generation failed");
            }
        }

        result
    }

    /// Entry point for the deprecated query-parameter endpoint
    ///
    /// Invalid input is reported as "Invalid URL provided"; errors from the
    /// delegate call are returned unchanged.
    pub async fn generate_legacy(&self, raw_url: &str) -> Result<UploadResult, QrError> {
        if let Err(e) = validate_url(raw_url) {
            metrics::counter!("qr.failed", "kind" => e.kind()).increment(1);
            return Err(QrError::Validation(format!("Invalid URL provided: {e}")));
        }

        self.generate(raw_url).await
    }

    async fn run(&self, raw_url: &str) -> Result<UploadResult, QrError> {
        let url = validate_url(raw_url)?;
        let original_url = url.to_string();

        let png = self.encoder.encode(&original_url)?;
        let size_bytes = png.len() as u64;

        // Clock read here, not at request arrival
        let key = artifact_key(&original_url, Utc::now());

        let started = Instant::now();
        self.store.put_object(&key, png, PNG_CONTENT_TYPE).await?;
        metrics::histogram!("qr.upload.duration_seconds").record(started.elapsed().as_secs_f64());
        metrics::counter!("qr.bytes.uploaded").increment(size_bytes);

        Ok(UploadResult {
            success: true,
            qr_code_url: public_url(self.store.bucket(), &self.public_domain, &key),
            original_url,
            file_name: key,
        })
    }
}
