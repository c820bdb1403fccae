//! One-time import of the registry-era store.
//!
//! The registry itself is behind [`LegacyRegistry`] so the import runs
//! anywhere; [`MemoryRegistry`] holds an exported copy.

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use super::ParseError;
use super::json::ZoneData;
use crate::common::collections::BTreeMap;
use crate::layout_engine::{CanvasLayoutInfo, CanvasZone, GridLayoutInfo, LayoutError};
use crate::model::device::{
    AppZoneHistoryData, CustomLayout, CustomZoneSetData, DEFAULT_SPACING, DEFAULT_ZONE_COUNT, DeviceIdData,
    DeviceInfoData, ZoneSetData, braced_upper,
};
use crate::model::zone_set::LayoutType;
use crate::sys::geometry::Rect;

pub const ROOT_KEY: &str = r"Software\SuperFancyZones";
pub const LAYOUTS_SUBKEY: &str = "Layouts";
pub const APP_ZONE_HISTORY_SUBKEY: &str = "AppZoneHistory";

const FIXED_BLOB_VERSION: u32 = 0xF00D;
const MAX_LEGACY_ZONES: usize = 40;
const FIXED_BLOB_HEADER: usize = 16;
const FIXED_BLOB_LEN: usize = FIXED_BLOB_HEADER + MAX_LEGACY_ZONES * 16;
const_assert_eq!(FIXED_BLOB_LEN, 656);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryValue {
    Dword(u32),
    String(String),
    Binary(Vec<u8>),
}

pub trait LegacyRegistry {
    /// Names of the direct children of `path`.
    fn subkeys(&self, path: &str) -> Vec<String>;
    fn values(&self, path: &str) -> Vec<(String, RegistryValue)>;
}

/// Registry snapshot keyed by full key path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryRegistry {
    #[serde(default)]
    pub keys: BTreeMap<String, BTreeMap<String, RegistryValue>>,
}

impl MemoryRegistry {
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> { ron::from_str(text) }

    pub fn insert(&mut self, path: impl Into<String>, name: impl Into<String>, value: RegistryValue) {
        self.keys.entry(path.into()).or_default().insert(name.into(), value);
    }
}

impl LegacyRegistry for MemoryRegistry {
    fn subkeys(&self, path: &str) -> Vec<String> {
        let prefix = format!("{path}\\");
        let mut children: Vec<String> = self
            .keys
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('\\').next())
            .filter(|child| !child.is_empty())
            .map(str::to_string)
            .collect();
        children.sort();
        children.dedup();
        children
    }

    fn values(&self, path: &str) -> Vec<(String, RegistryValue)> {
        self.keys
            .get(path)
            .map(|values| values.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }
}

struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self { Self { data, pos: 0 } }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        let end = self.pos + N;
        let bytes = self.data.get(self.pos..end).ok_or(ParseError::Truncated {
            needed: end,
            len: self.data.len(),
        })?;
        self.pos = end;
        let mut out = [0; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, ParseError> { Ok(self.take::<1>()?[0]) }

    fn u16_be(&mut self) -> Result<u16, ParseError> { Ok(u16::from_be_bytes(self.take()?)) }

    fn u16_le(&mut self) -> Result<u16, ParseError> { Ok(u16::from_le_bytes(self.take()?)) }

    fn u32_le(&mut self) -> Result<u32, ParseError> { Ok(u32::from_le_bytes(self.take()?)) }

    fn i32_le(&mut self) -> Result<i32, ParseError> { Ok(i32::from_le_bytes(self.take()?)) }

    fn seek(&mut self, pos: usize) { self.pos = pos; }
}

/// A fixed-layout zone set as stored per device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyZoneSet {
    pub layout_id: u16,
    pub zone_count: usize,
    pub layout: i32,
    /// The stored zone rects, `zone_count` of them.
    pub zones: Vec<Rect>,
}

pub fn parse_zone_set_blob(blob: &[u8]) -> Result<LegacyZoneSet, ParseError> {
    let mut reader = ByteReader::new(blob);
    let version = reader.u32_le()?;
    if version != FIXED_BLOB_VERSION {
        return Err(ParseError::Version(version));
    }
    let layout_id = reader.u16_le()?;
    reader.seek(8);
    let zone_count = reader.u32_le()?;
    let layout = reader.i32_le()?;
    if zone_count as usize > MAX_LEGACY_ZONES {
        return Err(ParseError::ZoneCount(zone_count));
    }

    let zones = (0..zone_count)
        .map(|_| {
            Ok(Rect::new(
                reader.i32_le()?,
                reader.i32_le()?,
                reader.i32_le()?,
                reader.i32_le()?,
            ))
        })
        .collect::<Result<Vec<_>, ParseError>>()?;

    Ok(LegacyZoneSet {
        layout_id,
        zone_count: zone_count as usize,
        layout,
        zones,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
enum LegacyLayoutKind {
    Grid = 0,
    Canvas = 1,
}

/// A user layout blob. Returns the layout id devices refer to it by.
pub fn parse_custom_layout_blob(blob: &[u8]) -> Result<(u16, CustomLayout), ParseError> {
    let mut reader = ByteReader::new(blob);
    let _version = reader.u16_be()?;
    let id = reader.u16_be()?;
    let kind = reader.u8()?;
    let kind = LegacyLayoutKind::try_from(kind).map_err(|err| ParseError::UnknownLayoutType(err.number))?;

    let layout = match kind {
        LegacyLayoutKind::Canvas => {
            let ref_width = i32::from(reader.u16_be()?);
            let ref_height = i32::from(reader.u16_be()?);
            let count = reader.u8()?;
            let zones = (0..count)
                .map(|_| {
                    Ok(CanvasZone {
                        x: i32::from(reader.u16_be()?),
                        y: i32::from(reader.u16_be()?),
                        width: i32::from(reader.u16_be()?),
                        height: i32::from(reader.u16_be()?),
                    })
                })
                .collect::<Result<Vec<_>, ParseError>>()?;
            CustomLayout::Canvas(CanvasLayoutInfo { ref_width, ref_height, zones })
        }
        LegacyLayoutKind::Grid => {
            let rows = usize::from(reader.u8()?);
            let columns = usize::from(reader.u8()?);
            let rows_percents =
                (0..rows).map(|_| reader.u16_be().map(i32::from)).collect::<Result<Vec<_>, _>>()?;
            let columns_percents =
                (0..columns).map(|_| reader.u16_be().map(i32::from)).collect::<Result<Vec<_>, _>>()?;
            let cell_child_map = (0..rows)
                .map(|_| (0..columns).map(|_| reader.u8().map(usize::from)).collect::<Result<Vec<_>, _>>())
                .collect::<Result<Vec<_>, _>>()?;
            let info = GridLayoutInfo {
                rows,
                columns,
                rows_percents,
                columns_percents,
                cell_child_map,
            };
            info.validate()?;
            CustomLayout::Grid(info)
        }
    };
    Ok((id, layout))
}

/// Zone set uuid assigned to a migrated user layout.
pub fn custom_layout_uuid(layout_id: u16) -> String { braced_upper(&Uuid::from_u128(u128::from(layout_id))) }

fn dword(values: &[(String, RegistryValue)], name: &str) -> Option<u32> {
    values.iter().find_map(|(n, v)| match v {
        RegistryValue::Dword(d) if n == name => Some(*d),
        _ => None,
    })
}

fn string<'a>(values: &'a [(String, RegistryValue)], name: &str) -> Option<&'a str> {
    values.iter().find_map(|(n, v)| match v {
        RegistryValue::String(s) if n == name => Some(s.as_str()),
        _ => None,
    })
}

fn binary<'a>(values: &'a [(String, RegistryValue)], name: &str) -> Option<&'a [u8]> {
    values.iter().find_map(|(n, v)| match v {
        RegistryValue::Binary(b) if n.eq_ignore_ascii_case(name) => Some(b.as_slice()),
        _ => None,
    })
}

fn migrate_custom_layouts(registry: &dyn LegacyRegistry, data: &mut ZoneData) {
    let path = format!(r"{ROOT_KEY}\{LAYOUTS_SUBKEY}");
    for (name, value) in registry.values(&path) {
        let RegistryValue::Binary(blob) = value else {
            debug!(%name, "ignoring non-binary layout value");
            continue;
        };
        match parse_custom_layout_blob(&blob) {
            Ok((id, layout)) => {
                trace!(%name, id, kind = layout.type_name(), "migrated custom layout");
                data.custom_zone_sets.insert(custom_layout_uuid(id), CustomZoneSetData { name, layout });
            }
            Err(err) => warn!(%name, %err, "skipping legacy custom layout"),
        }
    }
}

fn canvas_zone(rect: &Rect) -> Result<CanvasZone, ParseError> {
    match (rect.right.checked_sub(rect.left), rect.bottom.checked_sub(rect.top)) {
        (Some(width), Some(height)) => Ok(CanvasZone { x: rect.left, y: rect.top, width, height }),
        _ => Err(LayoutError::MalformedCanvas(format!("zone rect out of range {rect:?}")).into()),
    }
}

fn migrate_device(
    registry: &dyn LegacyRegistry,
    key: &str,
    data: &mut ZoneData,
) -> Result<(String, DeviceInfoData), ParseError> {
    let device: DeviceIdData = key.parse()?;
    let values = registry.values(&format!(r"{ROOT_KEY}\{key}"));

    let active = string(&values, "ActiveZoneSetId")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ParseError::MissingValue("ActiveZoneSetId".to_string()))?;
    let blob = binary(&values, active).ok_or_else(|| ParseError::MissingValue(active.to_string()))?;
    let zone_set = parse_zone_set_blob(blob)?;

    let layout_type = LayoutType::from_layout_id(zone_set.layout_id);
    let uuid = match layout_type {
        LayoutType::Custom => {
            let uuid = custom_layout_uuid(zone_set.layout_id);
            // Without a stored user layout the rects of the blob are all there is.
            if !data.custom_zone_sets.contains_key(&uuid) {
                let zones = zone_set.zones.iter().map(canvas_zone).collect::<Result<Vec<_>, _>>()?;
                let info = CanvasLayoutInfo {
                    ref_width: device.width,
                    ref_height: device.height,
                    zones,
                };
                info.validate()?;
                let layout = CustomLayout::Canvas(info);
                data.custom_zone_sets
                    .insert(uuid.clone(), CustomZoneSetData { name: format!("Layout {}", zone_set.layout_id), layout });
            }
            uuid
        }
        _ => match Uuid::parse_str(active) {
            Ok(id) => braced_upper(&id),
            Err(_) => active.to_string(),
        },
    };

    let info = DeviceInfoData {
        show_spacing: dword(&values, "ShowSpacing").is_none_or(|v| v != 0),
        spacing: dword(&values, "Spacing").map_or(DEFAULT_SPACING, |v| v as i32),
        zone_count: dword(&values, "ZoneCount").map_or(DEFAULT_ZONE_COUNT, |v| v as usize),
        ..DeviceInfoData::new(ZoneSetData::new(uuid, layout_type, zone_set.zone_count))
    };
    Ok((device.to_string(), info))
}

fn migrate_app_history(registry: &dyn LegacyRegistry, data: &mut ZoneData) {
    let path = format!(r"{ROOT_KEY}\{APP_ZONE_HISTORY_SUBKEY}");
    for monitor in registry.subkeys(&path) {
        let zone_set_uuid = data
            .devices
            .get(&monitor)
            .map(|info| info.active_zone_set.uuid.clone())
            .unwrap_or_default();
        for (app, value) in registry.values(&format!(r"{path}\{monitor}")) {
            let RegistryValue::Dword(index) = value else {
                warn!(%monitor, %app, "skipping non-numeric app zone history");
                continue;
            };
            let history = AppZoneHistoryData {
                zone_set_uuid: zone_set_uuid.clone(),
                device_id: monitor.clone(),
                zone_index_set: vec![index as usize],
            };
            let list = data.app_zone_history.entry(app).or_default();
            list.retain(|h| h.device_id != history.device_id);
            list.push(history);
        }
    }
}

/// Translates the registry store into zone data. Entries that cannot be read
/// are logged and left out.
pub fn migrate(registry: &dyn LegacyRegistry) -> ZoneData {
    let mut data = ZoneData::default();
    migrate_custom_layouts(registry, &mut data);

    for key in registry.subkeys(ROOT_KEY) {
        if key == LAYOUTS_SUBKEY || key == APP_ZONE_HISTORY_SUBKEY {
            continue;
        }
        match migrate_device(registry, &key, &mut data) {
            Ok((id, info)) => {
                data.devices.insert(id, info);
            }
            Err(err) => warn!(%key, %err, "skipping legacy device"),
        }
    }

    migrate_app_history(registry, &mut data);
    data
}
