//! Persisted per-device and per-application state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::zone_set::LayoutType;
use crate::layout_engine::{CanvasLayoutInfo, GridLayoutInfo};
use crate::sys::screen::{FALLBACK_DEVICE, trim_device_id};

pub const DEFAULT_SENSITIVITY_RADIUS: i32 = 20;
pub const DEFAULT_SPACING: i32 = 16;
pub const DEFAULT_ZONE_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid device id {0:?}")]
pub struct DeviceIdError(pub String);

/// Identifies one work area: a monitor at one resolution on one virtual desktop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceIdData {
    pub device_name: String,
    pub width: i32,
    pub height: i32,
    pub virtual_desktop_id: Uuid,
    /// Platform monitor name. Not part of the canonical string.
    pub monitor_id: String,
}

impl DeviceIdData {
    /// Builds the id from a raw platform device path, falling back to
    /// [`FALLBACK_DEVICE`] when the path has no usable part.
    pub fn from_device_path(device_path: &str, width: i32, height: i32, virtual_desktop_id: Uuid) -> Self {
        Self {
            device_name: trim_device_id(device_path),
            width,
            height,
            virtual_desktop_id,
            monitor_id: String::new(),
        }
    }

    pub fn is_fallback(&self) -> bool { self.device_name == FALLBACK_DEVICE }
}

pub(crate) fn braced_upper(id: &Uuid) -> String { id.braced().to_string().to_uppercase() }

impl fmt::Display for DeviceIdData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.device_name,
            self.width,
            self.height,
            braced_upper(&self.virtual_desktop_id)
        )
    }
}

impl FromStr for DeviceIdData {
    type Err = DeviceIdError;

    /// Parses `<name>_<width>_<height>_{<virtual desktop guid>}`. The name may
    /// itself contain underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || DeviceIdError(s.to_string());
        let mut parts = s.rsplitn(4, '_');
        let (Some(vd), Some(height), Some(width), Some(name)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(err());
        };
        if name.is_empty() {
            return Err(err());
        }
        Ok(Self {
            device_name: name.to_string(),
            width: width.parse().map_err(|_| err())?,
            height: height.parse().map_err(|_| err())?,
            virtual_desktop_id: Uuid::parse_str(vd).map_err(|_| err())?,
            monitor_id: String::new(),
        })
    }
}

/// Reference from a device to its active zone set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ZoneSetData {
    pub uuid: String,
    #[serde(rename = "type")]
    pub layout_type: LayoutType,
    /// Absent for custom layouts, whose zone count is implied by their geometry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_count: Option<usize>,
}

impl ZoneSetData {
    pub fn new(uuid: impl Into<String>, layout_type: LayoutType, zone_count: usize) -> Self {
        Self {
            uuid: uuid.into(),
            layout_type,
            zone_count: (layout_type != LayoutType::Custom).then_some(zone_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeviceInfoData {
    #[serde(rename = "active-zoneset")]
    pub active_zone_set: ZoneSetData,
    #[serde(rename = "editor-show-spacing")]
    pub show_spacing: bool,
    #[serde(rename = "editor-spacing")]
    pub spacing: i32,
    #[serde(rename = "editor-zone-count")]
    pub zone_count: usize,
    #[serde(rename = "editor-sensitivity-radius", default = "default_sensitivity_radius")]
    pub sensitivity_radius: i32,
}

impl DeviceInfoData {
    pub fn new(active_zone_set: ZoneSetData) -> Self {
        Self {
            active_zone_set,
            show_spacing: true,
            spacing: DEFAULT_SPACING,
            zone_count: DEFAULT_ZONE_COUNT,
            sensitivity_radius: DEFAULT_SENSITIVITY_RADIUS,
        }
    }

    /// Spacing actually applied between zones.
    pub fn effective_spacing(&self) -> i32 { if self.show_spacing { self.spacing } else { 0 } }
}

fn default_sensitivity_radius() -> i32 { DEFAULT_SENSITIVITY_RADIUS }

/// Geometry of a user-authored layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomLayout {
    Canvas(CanvasLayoutInfo),
    Grid(GridLayoutInfo),
}

impl CustomLayout {
    pub fn type_name(&self) -> &'static str {
        match self {
            CustomLayout::Canvas(_) => "canvas",
            CustomLayout::Grid(_) => "grid",
        }
    }

    pub fn zone_count(&self) -> usize {
        match self {
            CustomLayout::Canvas(info) => info.zones.len(),
            CustomLayout::Grid(info) => info.zone_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomZoneSetData {
    pub name: String,
    pub layout: CustomLayout,
}

/// Where an application's window was last zoned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AppZoneHistoryData {
    #[serde(rename = "zoneset-uuid")]
    pub zone_set_uuid: String,
    pub device_id: String,
    pub zone_index_set: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const VD: &str = "{33A2B101-06E0-437B-A61E-CDBECF502906}";

    #[test]
    fn device_id_canonical_form() {
        let id = DeviceIdData {
            device_name: "DELA026#5&10a58c63&0&UID16777488".to_string(),
            width: 2560,
            height: 1440,
            virtual_desktop_id: Uuid::parse_str(VD).unwrap(),
            monitor_id: String::new(),
        };
        let s = id.to_string();
        assert_eq!(s, format!("DELA026#5&10a58c63&0&UID16777488_2560_1440_{VD}"));
        assert_eq!(s.parse::<DeviceIdData>().unwrap(), id);
    }

    #[test]
    fn device_name_may_contain_underscores() {
        let id: DeviceIdData = format!("my_fancy_monitor_1920_1080_{VD}").parse().unwrap();
        assert_eq!(id.device_name, "my_fancy_monitor");
        assert_eq!((id.width, id.height), (1920, 1080));
    }

    #[test]
    fn rejects_malformed_device_ids() {
        for bad in [
            "",
            "name_1920_1080",
            "name_wide_1080_{33A2B101-06E0-437B-A61E-CDBECF502906}",
            "name_1920_1080_not-a-guid",
            "_1920_1080_{33A2B101-06E0-437B-A61E-CDBECF502906}",
        ] {
            assert!(bad.parse::<DeviceIdData>().is_err(), "{bad}");
        }
    }

    #[test]
    fn fallback_device_from_bad_path() {
        let id = DeviceIdData::from_device_path("garbage", 800, 600, Uuid::nil());
        assert!(id.is_fallback());
    }

    #[test]
    fn custom_zone_set_data_has_no_zone_count() {
        assert_eq!(ZoneSetData::new("{X}", LayoutType::Custom, 4).zone_count, None);
        assert_eq!(ZoneSetData::new("{X}", LayoutType::Rows, 4).zone_count, Some(4));
    }

    #[test]
    fn spacing_only_applies_when_shown() {
        let mut info = DeviceInfoData::new(ZoneSetData::new("{X}", LayoutType::Grid, 3));
        assert_eq!(info.effective_spacing(), DEFAULT_SPACING);
        info.show_spacing = false;
        assert_eq!(info.effective_spacing(), 0);
    }
}
