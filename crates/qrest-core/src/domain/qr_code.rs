//! QR code entity and rendering style

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use qrest_shared::utils::HEX_COLOR_REGEX;

pub const DEFAULT_FOREGROUND: &str = "#000000";
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCode {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub short_id: String,
    pub style_json: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QrCode {
    pub fn new(menu_id: Uuid, short_id: String, style_json: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            menu_id,
            short_id,
            style_json,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn style(&self) -> QrStyle {
        QrStyle::from_json(&self.style_json)
    }
}

/// Colors used when rendering. Missing or malformed entries fall back to
/// black on white.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrStyle {
    pub foreground: String,
    pub background: String,
}

impl Default for QrStyle {
    fn default() -> Self {
        Self {
            foreground: DEFAULT_FOREGROUND.to_string(),
            background: DEFAULT_BACKGROUND.to_string(),
        }
    }
}

impl QrStyle {
    pub fn from_json(value: &Value) -> Self {
        let pick = |key: &str, fallback: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .filter(|c| HEX_COLOR_REGEX.is_match(c))
                .unwrap_or(fallback)
                .to_string()
        };
        Self {
            foreground: pick("foreground", DEFAULT_FOREGROUND),
            background: pick("background", DEFAULT_BACKGROUND),
        }
    }

    /// Color as `[r, g, b]`, expanding the 3-digit shorthand.
    pub fn rgb(color: &str) -> [u8; 3] {
        let hex = color.trim_start_matches('#');
        let expanded: String = if hex.len() == 3 {
            hex.chars().flat_map(|c| [c, c]).collect()
        } else {
            hex.to_string()
        };
        let channel = |i: usize| {
            expanded
                .get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .unwrap_or(0)
        };
        [channel(0), channel(2), channel(4)]
    }
}

/// Output format for QR downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QrFormat {
    #[default]
    Png,
    Svg,
}

impl QrFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            QrFormat::Png => "png",
            QrFormat::Svg => "svg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            QrFormat::Png => "image/png",
            QrFormat::Svg => "image/svg+xml",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_style_defaults() {
        let style = QrStyle::from_json(&json!({}));
        assert_eq!(style, QrStyle::default());
    }

    #[test]
    fn test_style_rejects_bad_colors() {
        let style = QrStyle::from_json(&json!({"foreground": "#123456", "background": "blue"}));
        assert_eq!(style.foreground, "#123456");
        assert_eq!(style.background, DEFAULT_BACKGROUND);
    }

    #[test]
    fn test_rgb() {
        assert_eq!(QrStyle::rgb("#ff0080"), [255, 0, 128]);
        assert_eq!(QrStyle::rgb("#fff"), [255, 255, 255]);
    }

    #[test]
    fn test_format() {
        assert_eq!(QrFormat::Svg.extension(), "svg");
        assert_eq!(QrFormat::Png.content_type(), "image/png");
    }
}
