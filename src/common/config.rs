use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::layout_engine::MAX_ZONE_COUNT;
use crate::model::LayoutType;
use crate::model::device::{DEFAULT_SENSITIVITY_RADIUS, DEFAULT_SPACING, DEFAULT_ZONE_COUNT};

const MAX_SENSITIVITY_RADIUS: i32 = 1000;

fn home() -> PathBuf { dirs::home_dir().unwrap_or_else(std::env::temp_dir) }

pub fn data_dir() -> PathBuf { home().join(".zonal") }
pub fn zones_file() -> PathBuf { data_dir().join("zones.json") }
pub fn config_file() -> PathBuf { home().join(".zonal.toml") }

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: ZoneSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct ZoneSettings {
    /// Dragging only snaps to zones while shift is held. When false, holding
    /// shift suppresses snapping instead.
    #[serde(default = "yes")]
    pub shift_drag: bool,
    /// A secondary mouse button click during a drag toggles snapping.
    #[serde(default = "no")]
    pub mouse_switch: bool,
    #[serde(default = "no")]
    pub show_zones_on_all_monitors: bool,
    #[serde(default = "yes")]
    pub make_dragged_window_transparent: bool,
    /// Give windows their original size back when they leave a zone.
    #[serde(default = "yes")]
    pub restore_size: bool,
    #[serde(default = "yes")]
    pub warn_on_elevated_drag: bool,
    /// Arrow-key moves pick the zone geometrically instead of by index.
    #[serde(default = "no")]
    pub move_windows_based_on_position: bool,
    #[serde(default = "yes")]
    pub cycle_zones: bool,
    /// Process paths containing any of these (case-insensitive) are never zoned.
    #[serde(default)]
    pub excluded_apps: Vec<String>,
    #[serde(default = "default_sensitivity_radius")]
    pub sensitivity_radius: i32,
    #[serde(default = "default_spacing")]
    pub default_spacing: i32,
    #[serde(default = "default_zone_count")]
    pub default_zone_count: usize,
    #[serde(default)]
    pub default_layout: LayoutType,
}

impl Default for ZoneSettings {
    fn default() -> Self {
        Self {
            shift_drag: true,
            mouse_switch: false,
            show_zones_on_all_monitors: false,
            make_dragged_window_transparent: true,
            restore_size: true,
            warn_on_elevated_drag: true,
            move_windows_based_on_position: false,
            cycle_zones: true,
            excluded_apps: Vec::new(),
            sensitivity_radius: default_sensitivity_radius(),
            default_spacing: default_spacing(),
            default_zone_count: default_zone_count(),
            default_layout: LayoutType::default(),
        }
    }
}

impl ZoneSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !(0..=MAX_SENSITIVITY_RADIUS).contains(&self.sensitivity_radius) {
            issues.push(format!(
                "sensitivity_radius must be between 0 and {MAX_SENSITIVITY_RADIUS}, got {}",
                self.sensitivity_radius
            ));
        }
        if self.default_spacing < 0 {
            issues.push(format!("default_spacing must be non-negative, got {}", self.default_spacing));
        }
        if !(1..=MAX_ZONE_COUNT).contains(&self.default_zone_count) {
            issues.push(format!(
                "default_zone_count must be between 1 and {MAX_ZONE_COUNT}, got {}",
                self.default_zone_count
            ));
        }
        if self.default_layout == LayoutType::Custom {
            issues.push("default_layout cannot be custom".to_string());
        }
        for (index, app) in self.excluded_apps.iter().enumerate() {
            if app.trim().is_empty() {
                issues.push(format!("excluded_apps entry {index} is empty"));
            }
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if !(0..=MAX_SENSITIVITY_RADIUS).contains(&self.sensitivity_radius) {
            self.sensitivity_radius = default_sensitivity_radius();
            fixes += 1;
        }
        if self.default_spacing < 0 {
            self.default_spacing = default_spacing();
            fixes += 1;
        }
        if !(1..=MAX_ZONE_COUNT).contains(&self.default_zone_count) {
            self.default_zone_count = default_zone_count();
            fixes += 1;
        }
        if self.default_layout == LayoutType::Custom {
            self.default_layout = LayoutType::default();
            fixes += 1;
        }
        let before = self.excluded_apps.len();
        self.excluded_apps.retain(|app| !app.trim().is_empty());
        fixes += before - self.excluded_apps.len();

        fixes
    }
}

fn yes() -> bool { true }

fn no() -> bool { false }

fn default_sensitivity_radius() -> i32 { DEFAULT_SENSITIVITY_RADIUS }

fn default_spacing() -> i32 { DEFAULT_SPACING }

fn default_zone_count() -> usize { DEFAULT_ZONE_COUNT }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    /// Reads `path`, or the defaults if it does not exist.
    pub fn read_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() { Self::read(path) } else { Ok(Config::default()) }
    }

    /// Save the current config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> { self.settings.validate() }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize { self.settings.auto_fix_values() }

    pub fn parse(buf: &str) -> anyhow::Result<Config> { Ok(toml::from_str(buf)?) }
}
