use crate::config::{ErrorCorrection, QrConfig};
use crate::error::QrError;
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};
use std::io::Cursor;
use tracing::{debug, instrument};

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

/// Renders text as a black-on-white QR code PNG
///
/// The smallest QR version that fits the payload is chosen automatically.
/// Output is deterministic: the same text and settings always produce the
/// same bytes.
#[derive(Debug, Clone)]
pub struct QrEncoder {
    ec_level: EcLevel,
    box_size: u32,
    border: u32,
}

impl QrEncoder {
    pub fn new(config: &QrConfig) -> Self {
        Self {
            ec_level: config.error_correction.into(),
            box_size: config.box_size.max(1),
            border: config.border,
        }
    }

    /// Encode `text` and serialize it as PNG
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, QrError> {
        let code = QrCode::with_error_correction_level(text.as_bytes(), self.ec_level)
            .map_err(|e| QrError::Encoding(e.to_string()))?;

        let image = self.rasterize(&code)?;

        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| QrError::Encoding(e.to_string()))?;

        debug!(
            version = ?code.version(),
            modules = code.width(),
            size_px = image.width(),
            size_bytes = png.len(),
            "QR code rendered"
        );

        Ok(png)
    }

    /// Paint each module as a box_size square, surrounded by `border` light modules
    fn rasterize(&self, code: &QrCode) -> Result<GrayImage, QrError> {
        let modules = code.width() as u32;
        let side = modules
            .checked_add(self.border.saturating_mul(2))
            .and_then(|m| m.checked_mul(self.box_size))
            .ok_or_else(|| QrError::Encoding("rendered image is too large".to_string()))?;

        let colors = code.to_colors();
        let border = self.border;
        let box_size = self.box_size;

        Ok(GrayImage::from_fn(side, side, |x, y| {
            let (mx, my) = (x / box_size, y / box_size);
            if mx < border || my < border {
                return LIGHT;
            }
            let (mx, my) = (mx - border, my - border);
            if mx >= modules || my >= modules {
                return LIGHT;
            }
            match colors[(my * modules + mx) as usize] {
                Color::Dark => DARK,
                Color::Light => LIGHT,
            }
        }))
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new(&QrConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(png: &[u8]) -> String {
        let luma = image::load_from_memory(png).unwrap().to_luma8();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            luma.width() as usize,
            luma.height() as usize,
            |x, y| luma.get_pixel(x as u32, y as u32)[0],
        );
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1);
        let (_, content) = grids[0].decode().unwrap();
        content
    }

    #[test]
    fn test_round_trip() {
        let url = "https://example.com/some/path?query=1&other=two";
        let png = QrEncoder::default().encode(url).unwrap();
        assert_eq!(decode(&png), url);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let encoder = QrEncoder::default();
        let first = encoder.encode("https://example.com/").unwrap();
        let second = encoder.encode("https://example.com/").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_image_dimensions_follow_box_size_and_border() {
        // "https://example.com/" fits version 2 (25 modules) at level L
        let png = QrEncoder::default().encode("https://example.com/").unwrap();
        let image = image::load_from_memory(&png).unwrap();
        assert_eq!(image.width(), (25 + 2 * 4) * 10);
        assert_eq!(image.width(), image.height());
    }

    #[test]
    fn test_border_is_white() {
        let png = QrEncoder::default().encode("https://example.com/").unwrap();
        let luma = image::load_from_memory(&png).unwrap().to_luma8();
        assert!((0..luma.width()).all(|x| luma.get_pixel(x, 0)[0] == 255));
        assert!((0..39).all(|y| luma.get_pixel(0, y)[0] == 255));
        // Top-left finder pattern corner starts right after the quiet zone
        assert_eq!(luma.get_pixel(40, 40)[0], 0);
    }

    #[test]
    fn test_oversized_payload_is_encoding_error() {
        let text = format!("https://example.com/{}", "x".repeat(4000));
        let err = QrEncoder::default().encode(&text).unwrap_err();
        assert!(matches!(err, QrError::Encoding(_)));
    }

    #[test]
    fn test_higher_error_correction_round_trips() {
        let encoder = QrEncoder::new(&QrConfig {
            error_correction: ErrorCorrection::H,
            box_size: 4,
            border: 2,
        });
        let png = encoder.encode("https://example.com/").unwrap();
        assert_eq!(decode(&png), "https://example.com/");
    }
}
