//! Colour palettes and the manager that switches between them.

use std::collections::BTreeMap;
use std::str::FromStr;

use ratatui::style::Color;
use thiserror::Error;
use tracing::info;

use crate::config::CustomTheme;
use crate::format::StatusKind;
use crate::notify::NotificationKind;

pub const LIGHT: &str = "light";
pub const DARK: &str = "dark";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThemeError {
    #[error("unknown theme `{0}`")]
    Unknown(String),

    #[error("built-in theme `{0}` cannot be removed")]
    Builtin(String),

    #[error("invalid colour `{value}` for `{field}`")]
    InvalidColor { field: String, value: String },

    #[error("unknown palette field `{0}`")]
    UnknownField(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub dark: bool,
    pub background: Color,
    pub surface: Color,
    pub accent: Color,
    pub text: Color,
    pub muted: Color,
    pub border: Color,
    pub selection: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
}

impl Palette {
    pub const fn light() -> Self {
        Self {
            dark: false,
            background: Color::Rgb(0xff, 0xff, 0xff),
            surface: Color::Rgb(0xf8, 0xf9, 0xfa),
            accent: Color::Rgb(0x00, 0x7b, 0xff),
            text: Color::Rgb(0x21, 0x25, 0x29),
            muted: Color::Rgb(0x6c, 0x75, 0x7d),
            border: Color::Rgb(0xde, 0xe2, 0xe6),
            selection: Color::Rgb(0xe9, 0xec, 0xef),
            success: Color::Rgb(0x28, 0xa7, 0x45),
            warning: Color::Rgb(0xc7, 0x95, 0x00),
            error: Color::Rgb(0xdc, 0x35, 0x45),
            info: Color::Rgb(0x17, 0xa2, 0xb8),
        }
    }

    pub const fn dark() -> Self {
        Self {
            dark: true,
            background: Color::Rgb(0x1a, 0x1a, 0x1a),
            surface: Color::Rgb(0x2d, 0x2d, 0x2d),
            accent: Color::Rgb(0x4a, 0x9e, 0xff),
            text: Color::Rgb(0xff, 0xff, 0xff),
            muted: Color::Rgb(0xb0, 0xb0, 0xb0),
            border: Color::Rgb(0x40, 0x40, 0x40),
            selection: Color::Rgb(0x40, 0x40, 0x40),
            success: Color::Rgb(0x28, 0xa7, 0x45),
            warning: Color::Rgb(0xff, 0xc1, 0x07),
            error: Color::Rgb(0xdc, 0x35, 0x45),
            info: Color::Rgb(0x17, 0xa2, 0xb8),
        }
    }

    /// Copy of `self` with fields replaced from `name -> colour` pairs.
    /// Colours accept `#rrggbb` or ratatui colour names.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Result<Self, ThemeError> {
        for (field, value) in overrides {
            let color = Color::from_str(value).map_err(|_| ThemeError::InvalidColor {
                field: field.clone(),
                value: value.clone(),
            })?;
            let slot = match field.as_str() {
                "background" => &mut self.background,
                "surface" => &mut self.surface,
                "accent" | "primary" => &mut self.accent,
                "text" => &mut self.text,
                "muted" | "text-secondary" => &mut self.muted,
                "border" => &mut self.border,
                "selection" | "hover" => &mut self.selection,
                "success" => &mut self.success,
                "warning" => &mut self.warning,
                "error" => &mut self.error,
                "info" => &mut self.info,
                other => return Err(ThemeError::UnknownField(other.to_string())),
            };
            *slot = color;
        }
        Ok(self)
    }

    pub fn status_color(&self, kind: StatusKind) -> Color {
        match kind {
            StatusKind::Running => self.success,
            StatusKind::Paused | StatusKind::Created => self.warning,
            StatusKind::Stopped | StatusKind::Exited | StatusKind::Dead => self.error,
            StatusKind::Removing => self.info,
            StatusKind::Default => self.muted,
        }
    }

    pub fn notification_color(&self, kind: NotificationKind) -> Color {
        match kind {
            NotificationKind::Success => self.success,
            NotificationKind::Warning => self.warning,
            NotificationKind::Error => self.error,
            NotificationKind::Info => self.info,
        }
    }
}

/// Named palettes with one active at a time.
#[derive(Debug, Clone)]
pub struct ThemeManager {
    themes: BTreeMap<String, Palette>,
    current: String,
}

impl Default for ThemeManager {
    fn default() -> Self {
        let mut themes = BTreeMap::new();
        themes.insert(LIGHT.to_string(), Palette::light());
        themes.insert(DARK.to_string(), Palette::dark());
        Self {
            themes,
            current: LIGHT.to_string(),
        }
    }
}

impl ThemeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, name: &str) -> Result<(), ThemeError> {
        if !self.themes.contains_key(name) {
            return Err(ThemeError::Unknown(name.to_string()));
        }
        info!(theme = name, "applying theme");
        self.current = name.to_string();
        Ok(())
    }

    /// Switch between light and dark, based on the active palette.
    pub fn toggle(&mut self) -> &str {
        self.current = if self.is_dark() { LIGHT } else { DARK }.to_string();
        &self.current
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn palette(&self) -> &Palette {
        self.themes
            .get(&self.current)
            .unwrap_or(&BUILTIN_LIGHT)
    }

    pub fn is_dark(&self) -> bool {
        self.palette().dark
    }

    pub fn available(&self) -> Vec<&str> {
        self.themes.keys().map(String::as_str).collect()
    }

    /// Register (or replace) a custom palette. Built-ins cannot be shadowed.
    pub fn add_custom(&mut self, name: &str, palette: Palette) -> Result<(), ThemeError> {
        if is_builtin(name) {
            return Err(ThemeError::Builtin(name.to_string()));
        }
        self.themes.insert(name.to_string(), palette);
        Ok(())
    }

    /// Remove a custom palette; removing the active one falls back to light.
    pub fn remove(&mut self, name: &str) -> Result<(), ThemeError> {
        if is_builtin(name) {
            return Err(ThemeError::Builtin(name.to_string()));
        }
        if self.themes.remove(name).is_none() {
            return Err(ThemeError::Unknown(name.to_string()));
        }
        if self.current == name {
            self.current = LIGHT.to_string();
        }
        Ok(())
    }

    /// Register every `themes:` entry from the config. Entries that fail
    /// are skipped and returned alongside their error.
    pub fn register_all(
        &mut self,
        custom: &BTreeMap<String, CustomTheme>,
    ) -> Vec<(String, ThemeError)> {
        let mut failed = Vec::new();
        for (name, theme) in custom {
            let base = match theme.base.as_str() {
                LIGHT => Palette::light(),
                DARK => Palette::dark(),
                other => {
                    failed.push((name.clone(), ThemeError::Unknown(other.to_string())));
                    continue;
                }
            };
            let result = base
                .with_overrides(&theme.colors)
                .and_then(|palette| self.add_custom(name, palette));
            if let Err(e) = result {
                failed.push((name.clone(), e));
            }
        }
        failed
    }
}

const BUILTIN_LIGHT: Palette = Palette::light();

fn is_builtin(name: &str) -> bool {
    name == LIGHT || name == DARK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_light_and_toggles() {
        let mut themes = ThemeManager::new();
        assert_eq!(themes.current(), LIGHT);
        assert!(!themes.is_dark());
        assert_eq!(themes.toggle(), DARK);
        assert!(themes.is_dark());
        assert_eq!(themes.toggle(), LIGHT);
    }

    #[test]
    fn unknown_theme_is_rejected() {
        let mut themes = ThemeManager::new();
        assert_eq!(
            themes.apply("solarized"),
            Err(ThemeError::Unknown("solarized".into()))
        );
        assert_eq!(themes.current(), LIGHT);
    }

    #[test]
    fn custom_theme_lifecycle() {
        let mut themes = ThemeManager::new();
        let mut overrides = BTreeMap::new();
        overrides.insert("accent".to_string(), "#ff8800".to_string());
        let palette = Palette::dark().with_overrides(&overrides).unwrap();
        assert_eq!(palette.accent, Color::Rgb(0xff, 0x88, 0x00));

        themes.add_custom("ember", palette).unwrap();
        assert_eq!(themes.available(), ["dark", "ember", "light"]);
        themes.apply("ember").unwrap();
        assert!(themes.is_dark());

        themes.remove("ember").unwrap();
        assert_eq!(themes.current(), LIGHT);
        assert_eq!(themes.remove("ember"), Err(ThemeError::Unknown("ember".into())));
    }

    #[test]
    fn builtins_are_protected() {
        let mut themes = ThemeManager::new();
        assert_eq!(themes.remove(DARK), Err(ThemeError::Builtin(DARK.into())));
        assert!(themes.add_custom(LIGHT, Palette::dark()).is_err());
    }

    #[test]
    fn bad_overrides_are_reported() {
        let mut overrides = BTreeMap::new();
        overrides.insert("accent".to_string(), "not-a-colour".to_string());
        assert!(matches!(
            Palette::light().with_overrides(&overrides),
            Err(ThemeError::InvalidColor { .. })
        ));

        let mut overrides = BTreeMap::new();
        overrides.insert("glow".to_string(), "red".to_string());
        assert_eq!(
            Palette::light().with_overrides(&overrides),
            Err(ThemeError::UnknownField("glow".into()))
        );
    }

    #[test]
    fn config_themes_register_or_report() {
        let mut custom = BTreeMap::new();
        custom.insert(
            "ocean".to_string(),
            CustomTheme {
                base: "light".into(),
                colors: BTreeMap::from([("accent".to_string(), "blue".to_string())]),
            },
        );
        custom.insert(
            "broken".to_string(),
            CustomTheme {
                base: "sepia".into(),
                colors: BTreeMap::new(),
            },
        );
        custom.insert(
            "dark".to_string(),
            CustomTheme::default(),
        );

        let mut themes = ThemeManager::new();
        let failed = themes.register_all(&custom);
        assert_eq!(
            failed,
            vec![
                ("broken".to_string(), ThemeError::Unknown("sepia".into())),
                ("dark".to_string(), ThemeError::Builtin("dark".into())),
            ]
        );
        themes.apply("ocean").unwrap();
        assert!(!themes.is_dark());
        assert_eq!(themes.palette().accent, Color::Blue);
    }

    #[test]
    fn status_colours_follow_palette() {
        let p = Palette::dark();
        assert_eq!(p.status_color(StatusKind::Running), p.success);
        assert_eq!(p.status_color(StatusKind::Exited), p.error);
        assert_eq!(p.notification_color(NotificationKind::Info), p.info);
    }
}
