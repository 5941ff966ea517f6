use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Smallest width or height a layer may be transformed to.
pub const MIN_LAYER_SIZE: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random id for a layer created in the editor.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Hair,
    Eyes,
    Clothes,
    Background,
    Custom,
}

impl LayerKind {
    pub fn label(&self) -> &'static str {
        match self {
            LayerKind::Hair => "Hair",
            LayerKind::Eyes => "Eyes",
            LayerKind::Clothes => "Clothes",
            LayerKind::Background => "Background",
            LayerKind::Custom => "Custom",
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseKindError {
    #[error("Unknown layer kind {0}")]
    Unknown(String),
}

impl FromStr for LayerKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hair" => Ok(LayerKind::Hair),
            "eyes" => Ok(LayerKind::Eyes),
            "clothes" => Ok(LayerKind::Clothes),
            "background" => Ok(LayerKind::Background),
            "custom" => Ok(LayerKind::Custom),
            _ => Err(ParseKindError::Unknown(s.to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum HexColorError {
    #[error("Color must start with '#': {0}")]
    MissingHash(String),
    #[error("Color must have 3, 6 or 8 hex digits: {0}")]
    BadLength(String),
    #[error("Invalid hex digit in color {0}")]
    BadDigit(String),
}

/// A `#rgb`, `#rrggbb` or `#rrggbbaa` fill color, kept as the user wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Expands the color to 8-bit RGBA components.
    pub fn to_rgba(&self) -> [u8; 4] {
        let digits = &self.0[1..];
        let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).unwrap_or(0);
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).unwrap_or(0);
        match digits.len() {
            3 => [nibble(0) * 17, nibble(1) * 17, nibble(2) * 17, 255],
            6 => [byte(0), byte(2), byte(4), 255],
            _ => [byte(0), byte(2), byte(4), byte(6)],
        }
    }
}

impl FromStr for HexColor {
    type Err = HexColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| HexColorError::MissingHash(s.to_string()))?;
        if !matches!(digits.len(), 3 | 6 | 8) {
            return Err(HexColorError::BadLength(s.to_string()));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HexColorError::BadDigit(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for HexColor {
    type Error = HexColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(value: HexColor) -> Self {
        value.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Axis-aligned rectangle in canvas coordinates.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether every component is finite and both sides reach [`MIN_LAYER_SIZE`].
    pub fn is_valid(&self) -> bool {
        [self.x, self.y].iter().all(|v| v.is_finite())
            && [self.width, self.height]
                .iter()
                .all(|v| v.is_finite() && *v >= MIN_LAYER_SIZE)
    }

    /// Non-finite positions become 0 and undersized sides grow to
    /// [`MIN_LAYER_SIZE`].
    pub fn sanitized(&self) -> Geometry {
        let position = |v: f64| if v.is_finite() { v } else { 0.0 };
        let size = |v: f64| {
            if v.is_finite() && v >= MIN_LAYER_SIZE {
                v
            } else {
                MIN_LAYER_SIZE
            }
        };
        Geometry {
            x: position(self.x),
            y: position(self.y),
            width: size(self.width),
            height: size(self.height),
        }
    }

    /// Merges a proposed geometry into this one. A size below
    /// [`MIN_LAYER_SIZE`] or a non-finite value keeps the current value for
    /// that component.
    pub fn constrained(&self, proposed: Geometry) -> Geometry {
        let position = |current: f64, next: f64| if next.is_finite() { next } else { current };
        let size = |current: f64, next: f64| {
            if next.is_finite() && next >= MIN_LAYER_SIZE {
                next
            } else {
                current
            }
        };
        Geometry {
            x: position(self.x, proposed.x),
            y: position(self.y, proposed.y),
            width: size(self.width, proposed.width),
            height: size(self.height, proposed.height),
        }
    }
}

pub(crate) fn clamp_opacity(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub kind: LayerKind,
    pub visible: bool,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HexColor>,
    pub opacity: f64,
}

impl Layer {
    pub fn from_spec(id: LayerId, spec: LayerSpec) -> Self {
        Self {
            id,
            name: spec.name.unwrap_or_else(|| spec.kind.label().to_string()),
            kind: spec.kind,
            visible: true,
            geometry: spec.geometry.sanitized(),
            color: spec.color,
            opacity: clamp_opacity(spec.opacity.unwrap_or(1.0)),
        }
    }
}

/// What the editor needs to create a new layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub kind: LayerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HexColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl LayerSpec {
    pub fn new(kind: LayerKind, geometry: Geometry) -> Self {
        Self {
            kind,
            name: None,
            geometry,
            color: None,
            opacity: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_color(mut self, color: HexColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_colors() {
        assert!("#FFD700".parse::<HexColor>().is_ok());
        assert!("#fff".parse::<HexColor>().is_ok());
        assert!("#ff69b4cc".parse::<HexColor>().is_ok());
        assert_eq!(
            "FFD700".parse::<HexColor>(),
            Err(HexColorError::MissingHash("FFD700".to_string()))
        );
        assert_eq!(
            "#FFD7".parse::<HexColor>(),
            Err(HexColorError::BadLength("#FFD7".to_string()))
        );
        assert_eq!(
            "#GGGGGG".parse::<HexColor>(),
            Err(HexColorError::BadDigit("#GGGGGG".to_string()))
        );
    }

    #[test]
    fn hex_color_to_rgba() {
        let gold: HexColor = "#FFD700".parse().unwrap();
        assert_eq!(gold.to_rgba(), [255, 215, 0, 255]);
        let white: HexColor = "#fff".parse().unwrap();
        assert_eq!(white.to_rgba(), [255, 255, 255, 255]);
    }

    #[test]
    fn constrained_geometry_keeps_small_dimensions() {
        let current = Geometry::new(10.0, 10.0, 100.0, 100.0);
        let next = current.constrained(Geometry::new(20.0, 30.0, 3.0, 60.0));
        assert_eq!(next, Geometry::new(20.0, 30.0, 100.0, 60.0));

        let next = current.constrained(Geometry::new(f64::NAN, 5.0, 5.0, f64::INFINITY));
        assert_eq!(next, Geometry::new(10.0, 5.0, 5.0, 100.0));
    }

    #[test]
    fn layer_from_spec_uses_defaults() {
        let layer = Layer::from_spec(
            LayerId::new("l1"),
            LayerSpec::new(LayerKind::Clothes, Geometry::new(0.0, 0.0, 50.0, 50.0)),
        );
        assert_eq!(layer.name, "Clothes");
        assert!(layer.visible);
        assert_eq!(layer.opacity, 1.0);
        assert_eq!(layer.color, None);
    }

    #[test]
    fn layer_from_spec_grows_undersized_layers() {
        let layer = Layer::from_spec(
            LayerId::new("tiny"),
            LayerSpec::new(LayerKind::Custom, Geometry::new(f64::NAN, 4.0, 1.0, f64::INFINITY))
                .with_opacity(7.5),
        );
        assert_eq!(layer.geometry, Geometry::new(0.0, 4.0, 5.0, 5.0));
        assert!(layer.geometry.is_valid());
        assert_eq!(layer.opacity, 1.0);
    }

    #[test]
    fn layer_json_is_flat() {
        let layer = Layer::from_spec(
            LayerId::new("hair-layer"),
            LayerSpec::new(LayerKind::Hair, Geometry::new(50.0, 50.0, 100.0, 100.0))
                .with_color("#FFD700".parse().unwrap())
                .with_opacity(0.7),
        );
        let json = serde_json::to_value(&layer).unwrap();
        assert_eq!(json["id"], "hair-layer");
        assert_eq!(json["kind"], "hair");
        assert_eq!(json["width"], 100.0);
        assert_eq!(json["color"], "#FFD700");

        let bad = r#"{"id":"x","name":"X","kind":"hair","visible":true,"x":0,"y":0,"width":10,"height":10,"color":"red","opacity":1}"#;
        assert!(serde_json::from_str::<Layer>(bad).is_err());
    }
}
