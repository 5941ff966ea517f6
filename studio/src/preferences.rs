use std::sync::Arc;

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::storage::{
    FUN_MODE_KEY, KeyValueStore, SETTINGS_KEY, StorageError, THEME_KEY, load_json, store_json,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemePreferences {
    #[serde(rename = "isDarkMode")]
    pub dark_mode: bool,
    #[serde(rename = "isHighContrast")]
    pub high_contrast: bool,
    #[serde(rename = "isColorBlindMode")]
    pub color_blind: bool,
}

impl Default for ThemePreferences {
    fn default() -> Self {
        Self {
            dark_mode: true,
            high_contrast: false,
            color_blind: false,
        }
    }
}

impl ThemePreferences {
    /// e.g. `dark`, `light-high-contrast`, `dark-high-contrast-color-blind`.
    pub fn theme_name(&self) -> String {
        let mut name = String::from(if self.dark_mode { "dark" } else { "light" });
        if self.high_contrast {
            name.push_str("-high-contrast");
        }
        if self.color_blind {
            name.push_str("-color-blind");
        }
        name
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ja,
}

impl Language {
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ja => "日本語",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountSettings {
    pub language: Language,
    pub email_notifications: bool,
    pub community_updates: bool,
    pub keyboard_shortcuts: bool,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            language: Language::En,
            email_notifications: true,
            community_updates: true,
            keyboard_shortcuts: true,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Prank {
    pub id: &'static str,
    pub character: &'static str,
    pub message: &'static str,
    pub hair_color: &'static str,
}

pub static PRANKS: [Prank; 3] = [
    Prank {
        id: "kana-arima",
        character: "Kana Arima",
        message: "Hun, so you're a fan of Kana Arima who had zero relevance?",
        hair_color: "#ff4040",
    },
    Prank {
        id: "gojo-satoru",
        character: "Gojo Satoru",
        message: "Looking vibrant! My six eyes approve.",
        hair_color: "#FFFFFF",
    },
    Prank {
        id: "marin-kitagawa",
        character: "Marin Kitagawa",
        message: "Wow! This cosplay coloring is so perfect!",
        hair_color: "#FFD700",
    },
];

/// Theme, fun mode and account settings, saved after every change.
pub struct Preferences<S: ?Sized> {
    store: Arc<S>,
    theme: ThemePreferences,
    fun_mode: bool,
    settings: AccountSettings,
}

impl<S: KeyValueStore + ?Sized> Preferences<S> {
    pub fn load(store: Arc<S>) -> Result<Self, StorageError> {
        let theme = load_or_default(store.as_ref(), THEME_KEY)?;
        let fun_mode = load_or_default(store.as_ref(), FUN_MODE_KEY)?;
        let settings = load_or_default(store.as_ref(), SETTINGS_KEY)?;
        Ok(Self {
            store,
            theme,
            fun_mode,
            settings,
        })
    }

    pub fn theme(&self) -> ThemePreferences {
        self.theme
    }

    pub fn fun_mode(&self) -> bool {
        self.fun_mode
    }

    pub fn settings(&self) -> AccountSettings {
        self.settings
    }

    pub fn toggle_dark_mode(&mut self) -> Result<ThemePreferences, StorageError> {
        self.update_theme(|theme| theme.dark_mode = !theme.dark_mode)
    }

    pub fn toggle_high_contrast(&mut self) -> Result<ThemePreferences, StorageError> {
        self.update_theme(|theme| theme.high_contrast = !theme.high_contrast)
    }

    pub fn toggle_color_blind(&mut self) -> Result<ThemePreferences, StorageError> {
        self.update_theme(|theme| theme.color_blind = !theme.color_blind)
    }

    pub fn toggle_fun_mode(&mut self) -> Result<bool, StorageError> {
        self.fun_mode = !self.fun_mode;
        store_json(self.store.as_ref(), FUN_MODE_KEY, &self.fun_mode)?;
        tracing::debug!("Fun mode is now {}", self.fun_mode);
        Ok(self.fun_mode)
    }

    pub fn update_settings(
        &mut self,
        f: impl FnOnce(&mut AccountSettings),
    ) -> Result<AccountSettings, StorageError> {
        f(&mut self.settings);
        store_json(self.store.as_ref(), SETTINGS_KEY, &self.settings)?;
        Ok(self.settings)
    }

    /// A random character popup, only while fun mode is on.
    pub fn random_prank(&self, rng: &mut impl Rng) -> Option<&'static Prank> {
        if !self.fun_mode {
            return None;
        }
        PRANKS.choose(rng)
    }

    pub fn feature_announcement(&self, feature: &str) -> Option<String> {
        self.fun_mode.then(|| format!("{feature} unlocked!"))
    }

    fn update_theme(
        &mut self,
        f: impl FnOnce(&mut ThemePreferences),
    ) -> Result<ThemePreferences, StorageError> {
        f(&mut self.theme);
        store_json(self.store.as_ref(), THEME_KEY, &self.theme)?;
        tracing::debug!("Theme is now {}", self.theme.theme_name());
        Ok(self.theme)
    }
}

/// Missing or unreadable entries fall back to the default.
fn load_or_default<T, S>(store: &S, key: &str) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    match load_json(store, key) {
        Ok(value) => Ok(value.unwrap_or_default()),
        Err(StorageError::Json(err)) => {
            tracing::warn!("Ignoring unreadable {key}: {err}");
            Ok(T::default())
        }
        Err(err) => Err(err),
    }
}
