//! Find report domain types
//!
//! Shared between the export pipeline and the CLI:
//! - FindRecord: one find, as collected from the find file
//! - LocationContext: the resolved position plus both registry lookups
//! - AddressLookupResult / MunicipalityLookupResult: registry lookups, either may be absent

use serde::{Deserialize, Serialize};

use crate::coords::{parse_location_text, CoordSystem, Utm32};
use crate::error::{Error, Result};
use crate::i18n::Lang;
use std::path::Path;

/// Finder identity. Also the remembered-finder record in the local store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinderInfo {
    pub name: String,
    /// Free text, usually "<street>, <postcode> <place>"
    pub address: String,
    pub phone: String,
    pub email: String,
}

/// Landowner sub-form. Kommune/gnr/bnr override the registry lookups when filled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OwnerInfo {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub kommune: String,
    pub gnr: String,
    pub bnr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub material: String,
    pub age: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailWants {
    pub finder: bool,
    pub owner: bool,
}

impl EmailWants {
    pub fn any(&self) -> bool {
        self.finder || self.owner
    }
}

/// WGS84 position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// One find, as collected at export time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FindRecord {
    pub finder: FinderInfo,
    pub owner: OwnerInfo,
    pub object: ObjectInfo,
    /// Area type as typed by the user, mapped by `fields::map_arealtype`
    pub arealtype: String,
    /// Depth in centimetres, free text
    pub depth: String,
    /// "Lat: x, Lon: y" or "N: x, E: y"
    pub location_text: String,
    pub notes: String,
    /// Photo file paths, in caption order
    pub photos: Vec<String>,
    pub email_wants: EmailWants,
    pub lang: Lang,
    /// Device position; falls back to `location_text` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<LatLon>,
}

impl FindRecord {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Depth with its unit, `None` when no depth was entered
    pub fn depth_display(&self) -> Option<String> {
        let depth = self.depth.trim();
        (!depth.is_empty()).then(|| format!("{} cm", depth))
    }

    /// Device position if given, otherwise the parsed location text.
    pub fn resolve_position(&self) -> Result<LatLon> {
        if let Some(position) = self.position {
            return Ok(position);
        }
        let parsed = parse_location_text(&self.location_text).ok_or_else(|| {
            Error::Parse(format!("location not recognized: {:?}", self.location_text))
        })?;
        let (lat, lon) = parsed.to_wgs84();
        Ok(LatLon { lat, lon })
    }
}

/// Nearest address from the address point search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressLookupResult {
    pub street_text: String,
    pub postal_code: String,
    pub postal_place: String,
    pub municipality_name: String,
    /// Gardsnummer
    pub farm_number: String,
    /// Bruksnummer
    pub holding_number: String,
    pub distance_meters: Option<f64>,
    /// Representative point of the address itself
    pub point: Option<LatLon>,
}

/// County/municipality containing a point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityLookupResult {
    pub county_name: String,
    pub county_number: String,
    pub municipality_name: String,
    pub municipality_number: String,
}

/// Everything the location stage resolved, handed explicitly to the form populator.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationContext {
    pub position: LatLon,
    /// Present only inside zone 32 (3°E..=12°E)
    pub utm32: Option<Utm32>,
    pub system: CoordSystem,
    /// UTM32 was preferred but the position lies outside the zone
    pub fell_back_to_wgs84: bool,
    pub address: Option<AddressLookupResult>,
    pub municipality: Option<MunicipalityLookupResult>,
}

impl LocationContext {
    /// Builds the context for a position, applying the zone fallback rule.
    pub fn new(position: LatLon, preferred: CoordSystem) -> Self {
        let system = crate::coords::effective_system(preferred, position.lon);
        let utm32 = crate::coords::is_in_utm32_zone(position.lon)
            .then(|| crate::coords::wgs84_to_utm32(position.lat, position.lon));
        Self {
            position,
            utm32,
            system,
            fell_back_to_wgs84: preferred == CoordSystem::Utm32 && system == CoordSystem::Wgs84,
            address: None,
            municipality: None,
        }
    }

    pub fn with_lookups(
        mut self,
        address: Option<AddressLookupResult>,
        municipality: Option<MunicipalityLookupResult>,
    ) -> Self {
        self.address = address;
        self.municipality = municipality;
        self
    }
}
