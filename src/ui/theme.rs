use std::fs;

use dailyword::config::Config;
use ratatui::style::Color;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};

#[derive(Embed)]
#[folder = "assets/themes/"]
struct ThemeAssets;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThemeColors {
    pub bg: String,
    pub fg: String,
    pub text_dim: String,
    pub cell_border: String,
    pub cell_focused: String,
    pub cell_filled: String,
    pub cell_pop: String,
    pub accent: String,
    pub header_bg: String,
    pub header_fg: String,
    pub error: String,
    pub warning: String,
    pub success: String,
}

impl Theme {
    pub fn load(name: &str) -> Option<Self> {
        // User themes override bundled ones of the same name.
        let user_theme_path = Config::config_dir()
            .join("themes")
            .join(format!("{name}.toml"));
        if let Ok(content) = fs::read_to_string(&user_theme_path) {
            match toml::from_str::<Theme>(&content) {
                Ok(theme) => return Some(theme),
                Err(err) => log::warn!("ignoring {}: {err}", user_theme_path.display()),
            }
        }

        let file = ThemeAssets::get(&format!("{name}.toml"))?;
        let content = std::str::from_utf8(file.data.as_ref()).ok()?;
        toml::from_str::<Theme>(content).ok()
    }

    pub fn available_themes() -> Vec<String> {
        ThemeAssets::iter()
            .filter_map(|f| f.strip_suffix(".toml").map(|n| n.to_string()))
            .collect()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::load("midnight").unwrap_or_else(|| Self {
            name: "default".to_string(),
            colors: ThemeColors::default(),
        })
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            bg: "#1e1e2e".to_string(),
            fg: "#cdd6f4".to_string(),
            text_dim: "#6c7086".to_string(),
            cell_border: "#45475a".to_string(),
            cell_focused: "#89b4fa".to_string(),
            cell_filled: "#cdd6f4".to_string(),
            cell_pop: "#f9e2af".to_string(),
            accent: "#89b4fa".to_string(),
            header_bg: "#313244".to_string(),
            header_fg: "#cdd6f4".to_string(),
            error: "#f38ba8".to_string(),
            warning: "#fab387".to_string(),
            success: "#a6e3a1".to_string(),
        }
    }
}

impl ThemeColors {
    pub fn parse_color(hex: &str) -> Color {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6
            && let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            )
        {
            return Color::Rgb(r, g, b);
        }
        Color::White
    }

    pub fn bg(&self) -> Color { Self::parse_color(&self.bg) }
    pub fn fg(&self) -> Color { Self::parse_color(&self.fg) }
    pub fn text_dim(&self) -> Color { Self::parse_color(&self.text_dim) }
    pub fn cell_border(&self) -> Color { Self::parse_color(&self.cell_border) }
    pub fn cell_focused(&self) -> Color { Self::parse_color(&self.cell_focused) }
    pub fn cell_filled(&self) -> Color { Self::parse_color(&self.cell_filled) }
    pub fn cell_pop(&self) -> Color { Self::parse_color(&self.cell_pop) }
    pub fn accent(&self) -> Color { Self::parse_color(&self.accent) }
    pub fn header_bg(&self) -> Color { Self::parse_color(&self.header_bg) }
    pub fn header_fg(&self) -> Color { Self::parse_color(&self.header_fg) }
    pub fn error(&self) -> Color { Self::parse_color(&self.error) }
    pub fn warning(&self) -> Color { Self::parse_color(&self.warning) }
    pub fn success(&self) -> Color { Self::parse_color(&self.success) }
}
