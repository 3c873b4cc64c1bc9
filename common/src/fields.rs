//! Template field binding
//!
//! Logical field keys → field names of the official find report form.
//! The template is maintained by the county heritage offices, so names can
//! drift between revisions; callers must treat every binding as optional.

use serde::{Deserialize, Serialize};

/// Logical text fields written by the form populator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldKey {
    FinderName,
    FinderAddress,
    FinderPostalCode,
    FinderPlace,
    FinderPhone,
    FinderEmail,
    OwnerName,
    OwnerAddress,
    OwnerPostalCode,
    OwnerPlace,
    OwnerPhone,
    OwnerEmail,
    ObjectName,
    Depth,
    GpsNorth,
    GpsEast,
    Datum,
    County,
    Municipality,
    FarmHolding,
    FindDate,
    OtherInfo,
}

/// Checkboxes written by the form populator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CheckboxKey {
    OwnerPermission,
    MobileDevice,
    Area(AreaType),
}

/// Text field binding table
pub const FIELD_BINDINGS: &[(FieldKey, &str)] = &[
    (FieldKey::FinderName, "Navn finner"),
    (FieldKey::FinderAddress, "Adresse finner"),
    (FieldKey::FinderPostalCode, "Postnummer finner"),
    (FieldKey::FinderPlace, "Sted finner"),
    (FieldKey::FinderPhone, "Telefonnummer finner"),
    (FieldKey::FinderEmail, "E-post finner"),
    (FieldKey::OwnerName, "Grunneier"),
    (FieldKey::OwnerAddress, "Adresse grunneier"),
    (FieldKey::OwnerPostalCode, "Postnummer grunneier"),
    (FieldKey::OwnerPlace, "Sted grunneier"),
    (FieldKey::OwnerPhone, "Telefonnummer grunneier"),
    (FieldKey::OwnerEmail, "E-post grunneier"),
    (FieldKey::ObjectName, "Gjenstand"),
    (FieldKey::Depth, "Dybde"),
    (FieldKey::GpsNorth, "GPS-nord"),
    (FieldKey::GpsEast, "GPS-øst"),
    (FieldKey::Datum, "Datum/projeksjon"),
    (FieldKey::County, "Fylke"),
    (FieldKey::Municipality, "Kommune"),
    (FieldKey::FarmHolding, "Funnsted"),
    (FieldKey::FindDate, "Funndato"),
    (FieldKey::OtherInfo, "Andre opplysninger"),
];

/// "Grunneier har gitt tillatelse", the suffix is part of the template's field name
pub const PERMISSION_CHECKBOX: &str = "Grunneier har gitt tillatelse _y87rRhfj6A5hS8oITp7knw";
/// Measuring method: mobile phone
pub const MOBILE_DEVICE_CHECKBOX: &str = "Check Box12";

impl FieldKey {
    pub fn template_name(&self) -> &'static str {
        FIELD_BINDINGS
            .iter()
            .find(|(key, _)| key == self)
            .map(|(_, name)| *name)
            .unwrap_or("")
    }
}

impl CheckboxKey {
    pub fn template_name(&self) -> &'static str {
        match self {
            CheckboxKey::OwnerPermission => PERMISSION_CHECKBOX,
            CheckboxKey::MobileDevice => MOBILE_DEVICE_CHECKBOX,
            CheckboxKey::Area(area) => area.checkbox_name(),
        }
    }
}

/// Area type at the find site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaType {
    /// Åker (arable field)
    Field,
    /// Beite
    Pasture,
    /// Hage
    Garden,
    /// Skog
    Forest,
    /// Fjell
    Mountain,
    /// Strand
    Beach,
    /// Vann
    Water,
}

/// Accepted spellings, already lower-cased. "åker" has an ASCII spelling too.
const AREA_TABLE: &[(&str, AreaType)] = &[
    ("åker", AreaType::Field),
    ("aker", AreaType::Field),
    ("beite", AreaType::Pasture),
    ("hage", AreaType::Garden),
    ("skog", AreaType::Forest),
    ("fjell", AreaType::Mountain),
    ("strand", AreaType::Beach),
    ("vann", AreaType::Water),
];

impl AreaType {
    pub const ALL: [AreaType; 7] = [
        AreaType::Field,
        AreaType::Pasture,
        AreaType::Garden,
        AreaType::Forest,
        AreaType::Mountain,
        AreaType::Beach,
        AreaType::Water,
    ];

    /// Norwegian name, as printed next to the checkbox
    pub fn label(&self) -> &'static str {
        match self {
            AreaType::Field => "Åker",
            AreaType::Pasture => "Beite",
            AreaType::Garden => "Hage",
            AreaType::Forest => "Skog",
            AreaType::Mountain => "Fjell",
            AreaType::Beach => "Strand",
            AreaType::Water => "Vann",
        }
    }

    /// Checkbox name in the template
    pub fn checkbox_name(&self) -> &'static str {
        match self {
            AreaType::Field => "Check Box9",
            AreaType::Pasture => "Check Box4",
            AreaType::Garden => "Check Box11",
            AreaType::Forest => "Check Box5",
            AreaType::Mountain => "Check Box6",
            AreaType::Beach => "Check Box7",
            AreaType::Water => "Check Box10",
        }
    }
}

/// Nordic letters → ASCII, used as the second lookup attempt
fn ascii_substitute(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'å' => out.push('a'),
            'ø' => out.push('o'),
            'æ' => out.push_str("ae"),
            _ => out.push(c),
        }
    }
    out
}

/// Maps free-text area type to its checkbox; `None` leaves every area box unchecked.
///
/// ```
/// use funnskjema_common::{map_arealtype, AreaType};
///
/// assert_eq!(map_arealtype(" AKER "), Some(AreaType::Field));
/// assert_eq!(map_arealtype("myr"), None);
/// ```
pub fn map_arealtype(text: &str) -> Option<AreaType> {
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    let lookup = |key: &str| {
        AREA_TABLE
            .iter()
            .find(|(spelling, _)| *spelling == key)
            .map(|(_, area)| *area)
    };

    lookup(&normalized).or_else(|| lookup(&ascii_substitute(&normalized)))
}
