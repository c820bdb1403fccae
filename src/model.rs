pub mod device;
pub mod work_area;
pub mod zone;
pub mod zone_set;

pub use device::{
    AppZoneHistoryData, CustomLayout, CustomZoneSetData, DeviceIdData, DeviceInfoData, ZoneSetData,
};
pub use work_area::WorkArea;
pub use zone::Zone;
pub use zone_set::{LayoutType, ZoneSet, ZoneSetConfig};
