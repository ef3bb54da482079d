//! QR Code API
//!
//! HTTP service that renders a URL as a QR code PNG, uploads it to S3 and
//! returns the public-style URL of the stored object.
//!
//! ## Request pipeline
//!
//! ```text
//!  POST /generate            POST /generate-qr/?url=
//!  {"url": "..."}            (deprecated)
//!        │                          │
//!        │                   ┌──────────────┐
//!        │                   │ Legacy       │ re-signals invalid input
//!        │                   │ Adapter      │ as "Invalid URL provided"
//!        │                   └──────────────┘
//!        ▼                          │
//! ┌──────────────┐◀─────────────────┘
//! │ Validate     │  absolute http(s) URL with a host        → 400
//! └──────────────┘
//!        ▼
//! ┌──────────────┐
//! │ QR Encoder   │  minimal version, level L, 10px, border 4 → 400 if too long
//! └──────────────┘
//!        ▼
//! ┌──────────────┐
//! │ Naming       │  qr_codes/{sanitized}_{YYYYMMDD_HHMMSS_micros}.png
//! └──────────────┘
//!        ▼
//! ┌──────────────┐          ┌──────────────┐
//! │ Object Store │─────────▶│ S3 bucket    │                 → 500 on failure
//! └──────────────┘          └──────────────┘
//!        ▼
//!  {success, qr_code_url, original_url, file_name}
//! ```

pub mod api;
pub mod config;
pub mod encoder;
pub mod error;
pub mod health;
pub mod naming;
pub mod pipeline;
pub mod store;

pub use api::{create_router, AppState};
pub use config::Config;
pub use encoder::QrEncoder;
pub use error::QrError;
pub use health::HealthProbe;
pub use naming::artifact_key;
pub use pipeline::{validate_url, QrPipeline, UploadResult};
pub use store::{AuthMethod, ObjectStore, S3Store};
