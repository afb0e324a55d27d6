//! PNG and SVG rendering of menu QR codes

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb};
use qrcode::render::svg;
use qrcode::types::QrError;
use qrcode::QrCode;
use tracing::error;

use qrest_core::domain::QrStyle;
use qrest_core::error::DomainError;
use qrest_core::ports::QrRenderer;

#[derive(Debug, Default, Clone, Copy)]
pub struct QrCodeRenderer;

impl QrCodeRenderer {
    pub fn new() -> Self {
        Self
    }

    fn encode(data: &str) -> Result<QrCode, DomainError> {
        QrCode::new(data.as_bytes()).map_err(|e| match e {
            QrError::DataTooLong => DomainError::ValidationError("QR payload is too long".into()),
            other => {
                error!("QR encoding failed: {}", other);
                DomainError::InternalError(other.to_string())
            }
        })
    }
}

impl QrRenderer for QrCodeRenderer {
    fn render_png(&self, data: &str, width: u32, style: &QrStyle) -> Result<Vec<u8>, DomainError> {
        let code = Self::encode(data)?;
        let buffer = code
            .render::<Rgb<u8>>()
            .dark_color(Rgb(QrStyle::rgb(&style.foreground)))
            .light_color(Rgb(QrStyle::rgb(&style.background)))
            .min_dimensions(width, width)
            .build();

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(buffer)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| {
                error!("PNG encoding failed: {}", e);
                DomainError::InternalError(e.to_string())
            })?;
        Ok(bytes)
    }

    fn render_svg(&self, data: &str, width: u32, style: &QrStyle) -> Result<String, DomainError> {
        let code = Self::encode(data)?;
        Ok(code
            .render::<svg::Color>()
            .dark_color(svg::Color(&style.foreground))
            .light_color(svg::Color(&style.background))
            .min_dimensions(width, width)
            .build())
    }
}
