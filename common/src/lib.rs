//! Funnskjema common library
//!
//! Pure domain logic for the find report: types, coordinates, template field
//! binding, address splitting, page layout and localized labels.

pub mod address;
pub mod coords;
pub mod error;
pub mod fields;
pub mod i18n;
pub mod layout;
pub mod types;

pub use address::{parse_combined_address, AddressParts};
pub use coords::{
    effective_system, format_location, is_in_utm32_zone, parse_location_text, utm32_to_wgs84,
    wgs84_to_utm32, CoordSystem, LocationText, Utm32,
};
pub use error::{Error, Result};
pub use fields::{map_arealtype, AreaType, CheckboxKey, FieldKey, FIELD_BINDINGS};
pub use i18n::{Labels, Lang};
pub use layout::{plan_summary, PhotoSize, SummaryContent, SummaryPlan};
pub use types::{
    AddressLookupResult, EmailWants, FindRecord, FinderInfo, LatLon, LocationContext,
    MunicipalityLookupResult, ObjectInfo, OwnerInfo,
};
