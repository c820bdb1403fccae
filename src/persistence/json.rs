//! The `zones.json` document.
//!
//! Entries are read one at a time so a single bad entry only costs itself.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::ParseError;
use crate::common::collections::BTreeMap;
use crate::layout_engine::{CanvasLayoutInfo, GridLayoutInfo};
use crate::model::device::{AppZoneHistoryData, CustomLayout, CustomZoneSetData, DeviceInfoData};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneData {
    /// Keyed by application path; at most one entry per device.
    pub app_zone_history: BTreeMap<String, Vec<AppZoneHistoryData>>,
    /// Keyed by the canonical device id string.
    pub devices: BTreeMap<String, DeviceInfoData>,
    /// Keyed by braced zone set uuid.
    pub custom_zone_sets: BTreeMap<String, CustomZoneSetData>,
}

impl ZoneData {
    pub fn is_empty(&self) -> bool {
        self.app_zone_history.is_empty() && self.devices.is_empty() && self.custom_zone_sets.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct AppHistoryEntry {
    pub app_path: String,
    #[serde(rename = "zoneset-uuid")]
    pub zone_set_uuid: String,
    #[serde(default)]
    pub device_id: String,
    /// Older documents only carry a single index; `-1` means no zone.
    #[serde(default = "no_zone")]
    pub zone_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_index_set: Option<Vec<usize>>,
}

fn no_zone() -> i64 { -1 }

impl AppHistoryEntry {
    fn new(app_path: &str, data: &AppZoneHistoryData) -> Self {
        Self {
            app_path: app_path.to_string(),
            zone_set_uuid: data.zone_set_uuid.clone(),
            device_id: data.device_id.clone(),
            zone_index: data.zone_index_set.first().map_or(-1, |i| *i as i64),
            zone_index_set: Some(data.zone_index_set.clone()),
        }
    }

    fn into_data(self) -> (String, AppZoneHistoryData) {
        let zone_index_set = match self.zone_index_set {
            Some(set) => set,
            None => usize::try_from(self.zone_index).into_iter().collect(),
        };
        (
            self.app_path,
            AppZoneHistoryData {
                zone_set_uuid: self.zone_set_uuid,
                device_id: self.device_id,
                zone_index_set,
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(super) struct DeviceEntry {
    pub device_id: String,
    #[serde(flatten)]
    pub info: DeviceInfoData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct CustomZoneSetEntry {
    pub uuid: String,
    pub name: String,
    #[serde(rename = "type")]
    pub layout_type: String,
    pub info: Value,
}

impl CustomZoneSetEntry {
    pub(super) fn new(uuid: &str, data: &CustomZoneSetData) -> Result<Self, serde_json::Error> {
        let info = match &data.layout {
            CustomLayout::Canvas(info) => serde_json::to_value(info)?,
            CustomLayout::Grid(info) => serde_json::to_value(info)?,
        };
        Ok(Self {
            uuid: uuid.to_string(),
            name: data.name.clone(),
            layout_type: data.layout.type_name().to_string(),
            info,
        })
    }
}

impl TryFrom<CustomZoneSetEntry> for (String, CustomZoneSetData) {
    type Error = ParseError;

    fn try_from(entry: CustomZoneSetEntry) -> Result<Self, Self::Error> {
        let layout = match entry.layout_type.as_str() {
            "canvas" => {
                let info = serde_json::from_value::<CanvasLayoutInfo>(entry.info)?;
                info.validate()?;
                CustomLayout::Canvas(info)
            }
            "grid" => {
                let info = serde_json::from_value::<GridLayoutInfo>(entry.info)?;
                info.validate()?;
                CustomLayout::Grid(info)
            }
            _ => return Err(ParseError::UnknownCustomType(entry.layout_type)),
        };
        Ok((entry.uuid, CustomZoneSetData { name: entry.name, layout }))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Document {
    #[serde(default)]
    app_zone_history: Vec<Value>,
    #[serde(default)]
    devices: Vec<Value>,
    #[serde(default)]
    custom_zone_sets: Vec<Value>,
}

/// Decodes each array element on its own; failures are logged and skipped.
fn entries<T: for<'de> Deserialize<'de>>(section: &str, values: Vec<Value>) -> impl Iterator<Item = T> + '_ {
    values.into_iter().enumerate().filter_map(move |(index, value)| {
        serde_json::from_value(value)
            .inspect_err(|err| warn!(section, index, %err, "skipping unreadable entry"))
            .ok()
    })
}

/// Parses a zone document. Anything unreadable degrades to less data, never
/// to an error.
pub fn parse_document(text: &str) -> ZoneData {
    let document: Document = match serde_json::from_str(text) {
        Ok(document) => document,
        Err(err) => {
            warn!(%err, "zone data is not a valid document; starting empty");
            return ZoneData::default();
        }
    };

    let mut data = ZoneData::default();
    for entry in entries::<AppHistoryEntry>("app-zone-history", document.app_zone_history) {
        let (app, history) = entry.into_data();
        let list = data.app_zone_history.entry(app).or_default();
        list.retain(|e| e.device_id != history.device_id);
        list.push(history);
    }
    for entry in entries::<DeviceEntry>("devices", document.devices) {
        data.devices.insert(entry.device_id, entry.info);
    }
    for entry in entries::<CustomZoneSetEntry>("custom-zone-sets", document.custom_zone_sets) {
        let uuid = entry.uuid.clone();
        match <(String, CustomZoneSetData)>::try_from(entry) {
            Ok((uuid, set)) => {
                data.custom_zone_sets.insert(uuid, set);
            }
            Err(err) => warn!(%uuid, %err, "skipping custom zone set"),
        }
    }
    data
}

pub(super) fn custom_zone_set_values(
    sets: &BTreeMap<String, CustomZoneSetData>,
) -> Result<Vec<Value>, serde_json::Error> {
    sets.iter()
        .map(|(uuid, set)| serde_json::to_value(CustomZoneSetEntry::new(uuid, set)?))
        .collect()
}

pub fn to_document(data: &ZoneData) -> Result<Value, serde_json::Error> {
    let app_zone_history = data
        .app_zone_history
        .iter()
        .flat_map(|(app, list)| list.iter().map(move |h| AppHistoryEntry::new(app, h)))
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    let devices = data
        .devices
        .iter()
        .map(|(id, info)| {
            serde_json::to_value(DeviceEntry {
                device_id: id.clone(),
                info: info.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    serde_json::to_value(Document {
        app_zone_history,
        devices,
        custom_zone_sets: custom_zone_set_values(&data.custom_zone_sets)?,
    })
}

pub fn to_document_string(data: &ZoneData) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&to_document(data)?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::layout_engine::CanvasZone;
    use crate::model::device::ZoneSetData;
    use crate::model::zone_set::LayoutType;

    const DEVICE: &str = "DELA026#5&10a58c63&0&UID16777488_2560_1440_{33A2B101-06E0-437B-A61E-CDBECF502906}";

    fn sample() -> ZoneData {
        let mut data = ZoneData::default();
        data.app_zone_history.insert(
            r"C:\Program Files\app.exe".to_string(),
            vec![AppZoneHistoryData {
                zone_set_uuid: "{5AEFB1A1-C6A9-4D13-B2DB-1A1B08F3D1A5}".to_string(),
                device_id: DEVICE.to_string(),
                zone_index_set: vec![2, 3],
            }],
        );
        data.devices.insert(
            DEVICE.to_string(),
            DeviceInfoData::new(ZoneSetData::new("{5AEFB1A1-C6A9-4D13-B2DB-1A1B08F3D1A5}", LayoutType::Grid, 4)),
        );
        data.custom_zone_sets.insert(
            "{ABC}".to_string(),
            CustomZoneSetData {
                name: "canvas".to_string(),
                layout: CustomLayout::Canvas(CanvasLayoutInfo {
                    ref_width: 1920,
                    ref_height: 1080,
                    zones: vec![CanvasZone { x: 0, y: 0, width: 960, height: 1080 }],
                }),
            },
        );
        data.custom_zone_sets.insert(
            "{DEF}".to_string(),
            CustomZoneSetData {
                name: "grid".to_string(),
                layout: CustomLayout::Grid(GridLayoutInfo::even(2, 2)),
            },
        );
        data
    }

    #[test]
    fn empty_object_is_empty_data() {
        assert!(parse_document("{}").is_empty());
        assert!(parse_document("not json").is_empty());
        assert!(parse_document("").is_empty());
    }

    #[test]
    fn document_round_trips() {
        let data = sample();
        let text = to_document_string(&data).unwrap();
        assert_eq!(parse_document(&text), data);
    }

    #[test]
    fn document_shape() {
        let doc = to_document(&sample()).unwrap();
        let device = &doc["devices"][0];
        assert_eq!(device["device-id"], DEVICE);
        assert_eq!(device["active-zoneset"]["type"], "grid");
        assert_eq!(device["active-zoneset"]["zone-count"], 4);
        assert_eq!(device["editor-show-spacing"], true);
        assert_eq!(device["editor-spacing"], 16);
        assert_eq!(device["editor-zone-count"], 3);

        let app = &doc["app-zone-history"][0];
        assert_eq!(app["app-path"], r"C:\Program Files\app.exe");
        assert_eq!(app["zone-index"], 2);

        let custom = &doc["custom-zone-sets"][0];
        assert_eq!(custom["type"], "canvas");
        assert_eq!(custom["info"]["ref-width"], 1920);
        assert_eq!(custom["info"]["zones"][0]["X"], 0);
    }

    #[test]
    fn single_zone_index_is_accepted() {
        let data = parse_document(
            r#"{"app-zone-history": [
                {"app-path": "a.exe", "zoneset-uuid": "{X}", "zone-index": 1},
                {"app-path": "b.exe", "zoneset-uuid": "{X}", "zone-index": -1}
            ]}"#,
        );
        assert_eq!(data.app_zone_history["a.exe"][0].zone_index_set, vec![1]);
        assert!(data.app_zone_history["b.exe"][0].zone_index_set.is_empty());
    }

    #[test]
    fn custom_zone_set_without_zone_count() {
        let data = parse_document(
            r#"{"devices": [{
                "device-id": "d",
                "active-zoneset": {"uuid": "{ABC}", "type": "custom"},
                "editor-show-spacing": false,
                "editor-spacing": 0,
                "editor-zone-count": 3
            }]}"#,
        );
        let info = &data.devices["d"];
        assert_eq!(info.active_zone_set.layout_type, LayoutType::Custom);
        assert_eq!(info.active_zone_set.zone_count, None);
        assert_eq!(info.sensitivity_radius, 20);
    }

    #[test]
    fn bad_entries_are_skipped() {
        let data = parse_document(
            r#"{
                "devices": [
                    {"device-id": "broken"},
                    {"device-id": "ok", "active-zoneset": {"uuid": "{A}", "type": "rows", "zone-count": 2},
                     "editor-show-spacing": true, "editor-spacing": 4, "editor-zone-count": 2}
                ],
                "custom-zone-sets": [
                    {"uuid": "{A}", "name": "mystery", "type": "hexagon", "info": {}},
                    {"uuid": "{B}", "name": "bad grid", "type": "grid", "info":
                        {"rows": 1, "columns": 2, "rows-percentage": [10000],
                         "columns-percentage": [10000], "cell-child-map": [[0, 1]]}},
                    {"uuid": "{C}", "name": "fine", "type": "grid", "info":
                        {"rows": 1, "columns": 1, "rows-percentage": [10000],
                         "columns-percentage": [10000], "cell-child-map": [[0]]}}
                ]
            }"#,
        );
        assert_eq!(data.devices.keys().collect::<Vec<_>>(), vec!["ok"]);
        assert_eq!(data.custom_zone_sets.keys().collect::<Vec<_>>(), vec!["{C}"]);
    }

    #[test]
    fn out_of_range_layouts_are_skipped() {
        let data = parse_document(
            r#"{"custom-zone-sets": [
                {"uuid": "{A}", "name": "huge id", "type": "grid", "info":
                    {"rows": 1, "columns": 1, "rows-percentage": [10000],
                     "columns-percentage": [10000], "cell-child-map": [[18446744073709551615]]}},
                {"uuid": "{B}", "name": "far canvas", "type": "canvas", "info":
                    {"ref-width": 1920, "ref-height": 1080,
                     "zones": [{"X": 2147483000, "Y": 0, "width": 2000, "height": 1080}]}},
                {"uuid": "{C}", "name": "fine", "type": "canvas", "info":
                    {"ref-width": 1920, "ref-height": 1080,
                     "zones": [{"X": 0, "Y": 0, "width": 1920, "height": 1080}]}}
            ]}"#,
        );
        assert_eq!(data.custom_zone_sets.keys().collect::<Vec<_>>(), vec!["{C}"]);
    }

    #[test]
    fn unknown_custom_type_is_parse_error() {
        let entry = CustomZoneSetEntry {
            uuid: "{A}".to_string(),
            name: "x".to_string(),
            layout_type: "hexagon".to_string(),
            info: Value::Null,
        };
        assert_eq!(
            <(String, CustomZoneSetData)>::try_from(entry),
            Err(ParseError::UnknownCustomType("hexagon".to_string()))
        );
    }
}
