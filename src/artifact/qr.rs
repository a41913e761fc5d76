//! QR renderer: payload -> QR symbol -> grayscale raster -> PNG.

use std::io::Cursor;

use bytes::Bytes;
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};

use super::{Artifact, ArtifactError, ArtifactRenderer};
use crate::config::{ArtifactConfig, MAX_MODULE_SCALE, MAX_QUIET_ZONE};

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

#[derive(Debug, Clone)]
pub struct QrPngRenderer {
    module_scale: u32,
    quiet_zone: u32,
    ec_level: EcLevel,
}

impl QrPngRenderer {
    /// Scale and quiet zone are clamped to the ranges the config loader accepts.
    pub fn new(config: &ArtifactConfig) -> Self {
        Self {
            module_scale: config.module_scale.clamp(1, MAX_MODULE_SCALE),
            quiet_zone: config.quiet_zone.min(MAX_QUIET_ZONE),
            ec_level: EcLevel::M,
        }
    }

    fn encode(&self, payload: &[u8]) -> Result<QrCode, ArtifactError> {
        if payload.is_empty() {
            return Err(ArtifactError::EmptyPayload);
        }
        QrCode::with_error_correction_level(payload, self.ec_level)
            .map_err(|e| ArtifactError::Encode(e.to_string()))
    }

    /// Side length in pixels of the image rendered for a symbol `modules` wide.
    pub fn image_side(&self, modules: u32) -> u32 {
        (modules + 2 * self.quiet_zone) * self.module_scale
    }

    fn rasterize(&self, code: &QrCode) -> GrayImage {
        let width = code.width();
        let colors = code.to_colors();
        let side = self.image_side(width as u32);
        let scale = self.module_scale;
        let quiet = self.quiet_zone;

        GrayImage::from_fn(side, side, |x, y| {
            let (mx, my) = (x / scale, y / scale);
            if mx < quiet || my < quiet {
                return LIGHT;
            }
            let (mx, my) = ((mx - quiet) as usize, (my - quiet) as usize);
            if mx >= width || my >= width {
                return LIGHT;
            }
            match colors[my * width + mx] {
                Color::Dark => DARK,
                Color::Light => LIGHT,
            }
        })
    }
}

impl Default for QrPngRenderer {
    fn default() -> Self {
        Self::new(&ArtifactConfig::default())
    }
}

impl ArtifactRenderer for QrPngRenderer {
    fn render(&self, payload: &[u8]) -> Result<Artifact, ArtifactError> {
        let code = self.encode(payload)?;
        let raster = self.rasterize(&code);

        let mut buf = Vec::new();
        raster
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| ArtifactError::Image(e.to_string()))?;

        Ok(Artifact::png(Bytes::from(buf)))
    }

    /// Symbol construction only; rasterizing cannot fail once the symbol exists.
    fn validate(&self, payload: &[u8]) -> Result<(), ArtifactError> {
        self.encode(payload).map(|_| ())
    }
}
