//! Editor hand-off files.
//!
//! The editor writes these with a plain write, so a reader may see a partial
//! file. A file that does not parse is left where it is and read again later.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::json::{CustomZoneSetEntry, DeviceEntry, custom_zone_set_values};
use crate::common::collections::BTreeMap;
use crate::model::device::{CustomZoneSetData, DeviceInfoData};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CustomZoneSetsFile {
    custom_zone_sets: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DeletedCustomZoneSetsFile {
    deleted_custom_zone_sets: Vec<String>,
}

/// Reads and parses `path`, deleting it once parsed.
fn take<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(path = %path.display(), %err, "could not read hand-off file");
            return None;
        }
    };
    let parsed = match serde_json::from_str(&text) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(path = %path.display(), %err, "hand-off file not ready yet");
            return None;
        }
    };
    if let Err(err) = std::fs::remove_file(path) {
        warn!(path = %path.display(), %err, "could not delete hand-off file");
    }
    Some(parsed)
}

pub fn take_device(path: &Path) -> Option<(String, DeviceInfoData)> {
    take::<DeviceEntry>(path).map(|entry| (entry.device_id, entry.info))
}

pub fn take_custom_zone_sets(path: &Path) -> Option<Vec<(String, CustomZoneSetData)>> {
    let file = take::<CustomZoneSetsFile>(path)?;
    let sets = file
        .custom_zone_sets
        .into_iter()
        .filter_map(|value| {
            let entry: CustomZoneSetEntry = serde_json::from_value(value)
                .inspect_err(|err| warn!(%err, "skipping unreadable custom zone set"))
                .ok()?;
            let uuid = entry.uuid.clone();
            <(String, CustomZoneSetData)>::try_from(entry)
                .inspect_err(|err| warn!(%uuid, %err, "skipping custom zone set"))
                .ok()
        })
        .collect();
    Some(sets)
}

pub fn take_deleted_custom_zone_sets(path: &Path) -> Option<Vec<String>> {
    take::<DeletedCustomZoneSetsFile>(path).map(|file| file.deleted_custom_zone_sets)
}

/// Writes a device hand-off file the way the editor does.
pub fn write_device(path: &Path, device_id: &str, info: &DeviceInfoData) -> anyhow::Result<()> {
    let entry = DeviceEntry {
        device_id: device_id.to_string(),
        info: info.clone(),
    };
    std::fs::write(path, serde_json::to_string_pretty(&entry)?)?;
    Ok(())
}

pub fn write_custom_zone_sets(path: &Path, sets: &BTreeMap<String, CustomZoneSetData>) -> anyhow::Result<()> {
    let file = CustomZoneSetsFile {
        custom_zone_sets: custom_zone_set_values(sets)?,
    };
    std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
    Ok(())
}

pub fn write_deleted_custom_zone_sets(path: &Path, uuids: &[String]) -> anyhow::Result<()> {
    let file = DeletedCustomZoneSetsFile {
        deleted_custom_zone_sets: uuids.to_vec(),
    };
    std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use test_log::test;

    use super::*;
    use crate::layout_engine::GridLayoutInfo;
    use crate::model::device::{CustomLayout, ZoneSetData};
    use crate::model::zone_set::LayoutType;
    use crate::persistence::PersistenceStore;

    #[test]
    fn partial_file_stays_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("device.json");
        std::fs::write(&path, r#"{"device-id": "d", "active-zone"#).unwrap();
        assert!(take_device(&path).is_none());
        assert!(path.exists());
        assert!(take_device(&dir.path().join("missing.json")).is_none());
    }

    #[test]
    fn device_file_is_consumed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("device.json");
        let info = DeviceInfoData::new(ZoneSetData::new("{A}", LayoutType::Focus, 2));
        write_device(&path, "d", &info).unwrap();

        assert_eq!(take_device(&path), Some(("d".to_string(), info)));
        assert!(!path.exists());
        assert_eq!(take_device(&path), None);
    }

    #[test]
    fn custom_sets_added_then_deleted() {
        let dir = TempDir::new().unwrap();
        let added = dir.path().join("custom.json");
        let deleted = dir.path().join("deleted.json");

        let mut sets = BTreeMap::new();
        sets.insert(
            "{A}".to_string(),
            CustomZoneSetData {
                name: "thirds".to_string(),
                layout: CustomLayout::Grid(GridLayoutInfo::even(1, 3)),
            },
        );
        sets.insert(
            "{B}".to_string(),
            CustomZoneSetData {
                name: "halves".to_string(),
                layout: CustomLayout::Grid(GridLayoutInfo::even(1, 2)),
            },
        );
        write_custom_zone_sets(&added, &sets).unwrap();
        write_deleted_custom_zone_sets(&deleted, &["{A}".to_string()]).unwrap();

        let mut store = PersistenceStore::new(dir.path());
        assert!(store.import_custom_zone_sets_tmp_file(&added));
        assert!(store.custom_zone_set("{A}").is_some());
        assert!(store.import_deleted_custom_zone_sets_tmp_file(&deleted));
        assert!(store.custom_zone_set("{A}").is_none());
        assert_eq!(store.custom_zone_set("{B}").map(|s| s.name.as_str()), Some("halves"));
        assert!(!added.exists() && !deleted.exists());
    }
}
