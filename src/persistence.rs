//! On-disk zone data: the JSON document, the editor hand-off files and the
//! one-time migration from the legacy registry store.

pub mod json;
pub mod legacy;
pub mod tmp_file;

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info, warn};

pub use self::json::ZoneData;
pub use self::legacy::{LegacyRegistry, MemoryRegistry, RegistryValue};
use crate::layout_engine::LayoutError;
use crate::model::device::{AppZoneHistoryData, CustomZoneSetData, DeviceIdError, DeviceInfoData, ZoneSetData};
use crate::model::zone_set::LayoutType;
use crate::sys::geometry::Rect;

pub const ZONES_FILE_NAME: &str = "zones.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not serialize zone data: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io { path: path.to_path_buf(), source }
    }
}

/// A single unreadable entry. The entry is skipped; the rest of the data loads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("blob truncated: needed {needed} bytes, have {len}")]
    Truncated { needed: usize, len: usize },
    #[error("unsupported blob version {0:#x}")]
    Version(u32),
    #[error("unknown custom layout type {0}")]
    UnknownLayoutType(u8),
    #[error("unknown custom layout type {0:?}")]
    UnknownCustomType(String),
    #[error("{0} zones is more than the format allows")]
    ZoneCount(u32),
    #[error("missing value {0}")]
    MissingValue(String),
    #[error(transparent)]
    DeviceId(#[from] DeviceIdError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("invalid json entry: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self { ParseError::Json(err.to_string()) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    #[error("zone set id is empty")]
    EmptyId,
    #[error("work area key is empty")]
    EmptyWorkAreaKey,
    #[error("layout {0} needs at least one zone")]
    ZoneCount(LayoutType),
    #[error("zone {index} has an inverted rect {rect:?}")]
    InvalidRect { index: usize, rect: Rect },
    #[error("could not write hand-off file {}: {message}", path.display())]
    Write { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Read from the JSON document.
    File,
    /// No document existed; the legacy store was migrated and saved.
    Migrated,
    Empty,
}

/// Owns the zone data of one installation and the file it lives in.
///
/// Mutations mark the store dirty; dirty state is flushed on drop. Save
/// failures leave both the file and the in-memory data as they were.
#[derive(Debug)]
pub struct PersistenceStore {
    path: PathBuf,
    data: ZoneData,
    dirty: bool,
}

impl PersistenceStore {
    /// A store rooted at `root`, persisting to `root/zones.json`.
    pub fn new(root: impl AsRef<Path>) -> Self { Self::with_file(root.as_ref().join(ZONES_FILE_NAME)) }

    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: ZoneData::default(),
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn data(&self) -> &ZoneData { &self.data }

    pub fn is_dirty(&self) -> bool { self.dirty }

    /// Loads the document. When it does not exist yet the legacy store, if
    /// any, is migrated once and written out.
    pub fn load(&mut self, legacy: Option<&dyn LegacyRegistry>) -> LoadSource {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => {
                self.data = json::parse_document(&text);
                self.dirty = false;
                debug!(
                    path = %self.path.display(),
                    devices = self.data.devices.len(),
                    custom = self.data.custom_zone_sets.len(),
                    apps = self.data.app_zone_history.len(),
                    "loaded zone data"
                );
                return LoadSource::File;
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(path = %self.path.display(), %err, "could not read zone data; starting empty");
                self.data = ZoneData::default();
                return LoadSource::Empty;
            }
        }

        let Some(registry) = legacy else {
            self.data = ZoneData::default();
            return LoadSource::Empty;
        };
        self.data = legacy::migrate(registry);
        if self.data.is_empty() {
            return LoadSource::Empty;
        }
        info!(devices = self.data.devices.len(), "migrated legacy zone data");
        self.dirty = true;
        if let Err(err) = self.save() {
            error!(%err, "could not save migrated zone data");
        }
        LoadSource::Migrated
    }

    /// Writes the document atomically through a sibling temp file.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let text = json::to_document_string(&self.data)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| StoreError::io(&dir, e))?;
        tmp.write_all(text.as_bytes()).map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&self.path).map_err(|e| StoreError::io(&self.path, e.error))?;

        self.dirty = false;
        debug!(path = %self.path.display(), "saved zone data");
        Ok(())
    }

    pub fn device(&self, device_id: &str) -> Option<&DeviceInfoData> { self.data.devices.get(device_id) }

    pub fn set_device(&mut self, device_id: impl Into<String>, info: DeviceInfoData) {
        self.data.devices.insert(device_id.into(), info);
        self.dirty = true;
    }

    pub fn remove_device(&mut self, device_id: &str) -> Option<DeviceInfoData> {
        let removed = self.data.devices.remove(device_id);
        self.dirty |= removed.is_some();
        removed
    }

    pub fn custom_zone_set(&self, uuid: &str) -> Option<&CustomZoneSetData> { self.data.custom_zone_sets.get(uuid) }

    pub fn set_custom_zone_set(&mut self, uuid: impl Into<String>, zone_set: CustomZoneSetData) {
        self.data.custom_zone_sets.insert(uuid.into(), zone_set);
        self.dirty = true;
    }

    pub fn remove_custom_zone_set(&mut self, uuid: &str) -> Option<CustomZoneSetData> {
        let removed = self.data.custom_zone_sets.remove(uuid);
        self.dirty |= removed.is_some();
        removed
    }

    /// Records where `app_path` was last zoned on `data.device_id`,
    /// replacing any earlier entry for that device.
    pub fn set_app_last_zone(&mut self, app_path: impl Into<String>, data: AppZoneHistoryData) {
        let entries = self.data.app_zone_history.entry(app_path.into()).or_default();
        entries.retain(|e| e.device_id != data.device_id);
        entries.push(data);
        self.dirty = true;
    }

    pub fn app_last_zone(&self, app_path: &str, device_id: &str, zone_set_uuid: &str) -> Option<&[usize]> {
        self.data
            .app_zone_history
            .get(app_path)?
            .iter()
            .find(|e| e.device_id == device_id && e.zone_set_uuid == zone_set_uuid)
            .map(|e| e.zone_index_set.as_slice())
    }

    pub fn remove_app_last_zone(&mut self, app_path: &str, device_id: &str, zone_set_uuid: &str) -> bool {
        let Some(entries) = self.data.app_zone_history.get_mut(app_path) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| !(e.device_id == device_id && e.zone_set_uuid == zone_set_uuid));
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.data.app_zone_history.remove(app_path);
        }
        self.dirty |= removed;
        removed
    }

    /// Applies an editor device hand-off file, if one is ready.
    pub fn import_device_tmp_file(&mut self, path: &Path) -> bool {
        let Some((device_id, info)) = tmp_file::take_device(path) else {
            return false;
        };
        info!(device = %device_id, layout = %info.active_zone_set.layout_type, "applied editor layout");
        self.set_device(device_id, info);
        true
    }

    pub fn import_custom_zone_sets_tmp_file(&mut self, path: &Path) -> bool {
        let Some(sets) = tmp_file::take_custom_zone_sets(path) else {
            return false;
        };
        for (uuid, set) in sets {
            self.set_custom_zone_set(uuid, set);
        }
        true
    }

    pub fn import_deleted_custom_zone_sets_tmp_file(&mut self, path: &Path) -> bool {
        let Some(uuids) = tmp_file::take_deleted_custom_zone_sets(path) else {
            return false;
        };
        for uuid in uuids {
            self.remove_custom_zone_set(&uuid);
        }
        true
    }
}

impl Drop for PersistenceStore {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(err) = self.save() {
                error!(%err, "could not flush zone data");
            }
        }
    }
}

/// Entry point for the layout editor: turns the editor's choice into a
/// [`ZoneSetData`] and hands it over through the device temp file.
#[allow(clippy::too_many_arguments)]
pub fn persist_zone_set(
    work_area_key: &str,
    layout_id: u16,
    zone_count: usize,
    zone_rects: &[Rect],
    tmp_path: &Path,
    show_spacing: bool,
    spacing: i32,
    editor_zone_count: usize,
    uuid: &str,
) -> Result<ZoneSetData, PersistError> {
    let uuid = uuid.trim().trim_start_matches('{').trim_end_matches('}');
    if uuid.is_empty() {
        return Err(PersistError::EmptyId);
    }
    if work_area_key.is_empty() {
        return Err(PersistError::EmptyWorkAreaKey);
    }
    let layout_type = LayoutType::from_layout_id(layout_id);
    if layout_type != LayoutType::Custom && zone_count == 0 {
        return Err(PersistError::ZoneCount(layout_type));
    }
    if let Some((index, rect)) = zone_rects.iter().enumerate().find(|(_, r)| !r.is_normalized()) {
        return Err(PersistError::InvalidRect { index, rect: *rect });
    }

    let data = ZoneSetData::new(format!("{{{uuid}}}"), layout_type, zone_count);
    let info = DeviceInfoData {
        show_spacing,
        spacing,
        zone_count: editor_zone_count,
        ..DeviceInfoData::new(data.clone())
    };
    tmp_file::write_device(tmp_path, work_area_key, &info).map_err(|err| PersistError::Write {
        path: tmp_path.to_path_buf(),
        message: err.to_string(),
    })?;
    Ok(data)
}
