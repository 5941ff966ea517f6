use serde::{Deserialize, Serialize};

use crate::HexColor;

/// Colors picked for the character before colorizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterPalette {
    pub hair: HexColor,
    pub eyes: HexColor,
    pub clothes: HexColor,
}

impl Default for CharacterPalette {
    fn default() -> Self {
        Self {
            hair: HexColor::try_from("#FFD700".to_string()).expect("valid literal"),
            eyes: HexColor::try_from("#FF69B4".to_string()).expect("valid literal"),
            clothes: HexColor::try_from("#191970".to_string()).expect("valid literal"),
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorStyle {
    HandDrawn,
    #[default]
    AnimeStyle,
    CelShading,
    VintageManga,
    FanArt,
}

impl ColorStyle {
    pub const ALL: [ColorStyle; 5] = [
        ColorStyle::HandDrawn,
        ColorStyle::AnimeStyle,
        ColorStyle::CelShading,
        ColorStyle::VintageManga,
        ColorStyle::FanArt,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ColorStyle::HandDrawn => "hand-drawn",
            ColorStyle::AnimeStyle => "anime-style",
            ColorStyle::CelShading => "cel-shading",
            ColorStyle::VintageManga => "vintage-manga",
            ColorStyle::FanArt => "fan-art",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ColorStyle::HandDrawn => "Hand-Drawn",
            ColorStyle::AnimeStyle => "Anime-Style",
            ColorStyle::CelShading => "Cel-Shading",
            ColorStyle::VintageManga => "Vintage Manga",
            ColorStyle::FanArt => "Fan Art",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|style| style.id() == id)
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColoringMode {
    #[default]
    Character,
    Scene,
}

/// Post-processing sliders, each on a 0..=100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostProcessSettings {
    pub contrast: u8,
    pub shading_intensity: u8,
    pub screentone_density: u8,
}

impl Default for PostProcessSettings {
    fn default() -> Self {
        Self {
            contrast: 50,
            shading_intensity: 60,
            screentone_density: 30,
        }
    }
}

impl PostProcessSettings {
    pub fn new(contrast: u32, shading_intensity: u32, screentone_density: u32) -> Self {
        let slider = |v: u32| v.min(100) as u8;
        Self {
            contrast: slider(contrast),
            shading_intensity: slider(shading_intensity),
            screentone_density: slider(screentone_density),
        }
    }
}
