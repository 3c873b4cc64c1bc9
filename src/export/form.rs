//! Fills the find report template
//!
//! All writes go through the binding table; a field the template lacks is
//! logged and recorded in the report, the remaining writes continue.

use super::acroform::{AcroForm, Skipped, Written};
use chrono::NaiveDate;
use funnskjema_common::{
    map_arealtype, parse_combined_address, AddressParts, AreaType, CheckboxKey, CoordSystem,
    FieldKey, FindRecord, LocationContext, FIELD_BINDINGS,
};
use std::collections::BTreeMap;

/// Outcome of every attempted write, keyed by template field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulateReport {
    pub outcomes: BTreeMap<String, Result<Written, Skipped>>,
}

impl PopulateReport {
    pub fn written(&self) -> impl Iterator<Item = (&str, &Written)> {
        self.outcomes
            .iter()
            .filter_map(|(name, outcome)| outcome.as_ref().ok().map(|w| (name.as_str(), w)))
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &Skipped)> {
        self.outcomes
            .iter()
            .filter_map(|(name, outcome)| outcome.as_ref().err().map(|s| (name.as_str(), s)))
    }

    pub fn written_count(&self) -> usize {
        self.written().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }

    /// Every binding skipped as missing, for a template without a form
    pub fn without_form() -> Self {
        let checkboxes = [CheckboxKey::OwnerPermission, CheckboxKey::MobileDevice]
            .into_iter()
            .chain(AreaType::ALL.into_iter().map(CheckboxKey::Area))
            .map(|key| key.template_name());
        let outcomes = FIELD_BINDINGS
            .iter()
            .map(|(_, name)| *name)
            .chain(checkboxes)
            .map(|name| (name.to_string(), Err(Skipped::Missing)))
            .collect();
        Self { outcomes }
    }

    fn record(&mut self, name: &str, outcome: Result<Written, Skipped>) {
        if let Err(reason) = &outcome {
            log::warn!("form field {:?} skipped: {}", name, reason);
        }
        self.outcomes.insert(name.to_string(), outcome);
    }
}

struct Populator<'f, 'd> {
    form: &'f mut AcroForm<'d>,
    report: PopulateReport,
}

impl Populator<'_, '_> {
    /// Writes a text field. Blank values leave the field untouched.
    fn text(&mut self, key: FieldKey, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let name = key.template_name();
        let outcome = self.form.set_text(name, value);
        self.report.record(name, outcome);
    }

    /// Writes a text field, blank included, so a preset template value is cleared
    fn contact(&mut self, key: FieldKey, value: &str) {
        let name = key.template_name();
        let outcome = self.form.set_text(name, value.trim());
        self.report.record(name, outcome);
    }

    fn checkbox(&mut self, key: CheckboxKey, checked: bool) {
        let name = key.template_name();
        let outcome = self.form.force_checkbox(name, checked);
        self.report.record(name, outcome);
    }

    fn address(&mut self, keys: [FieldKey; 3], parts: &AddressParts) {
        let [street, postal_code, place] = keys;
        self.contact(street, &parts.street);
        self.contact(postal_code, &parts.postal_code);
        self.contact(place, &parts.place);
    }
}

/// First non-blank value
fn first_filled<'a>(candidates: impl IntoIterator<Item = &'a str>) -> &'a str {
    candidates
        .into_iter()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or("")
}

/// `"gnr/bnr"`, either one alone, or empty
pub fn farm_holding(gnr: &str, bnr: &str) -> String {
    match (gnr.trim(), bnr.trim()) {
        ("", "") => String::new(),
        (gnr, "") => gnr.to_string(),
        ("", bnr) => bnr.to_string(),
        (gnr, bnr) => format!("{}/{}", gnr, bnr),
    }
}

/// Material, age and notes, one per line, blanks left out
pub fn other_info(record: &FindRecord) -> String {
    let labels = record.lang.labels();
    let material = record.object.material.trim();
    let age = record.object.age.trim();

    let mut parts = Vec::new();
    if !material.is_empty() {
        parts.push(format!("{}: {}", labels.material, material));
    }
    if !age.is_empty() {
        parts.push(format!("{}: {}", labels.age, age));
    }
    if !record.notes.trim().is_empty() {
        parts.push(record.notes.trim().to_string());
    }
    parts.join("\n")
}

/// GPS north, GPS east and datum label for the effective system
pub fn gps_values(ctx: &LocationContext) -> (String, String, &'static str) {
    match (ctx.system, ctx.utm32) {
        (CoordSystem::Utm32, Some(utm)) => (
            format!("{:.0}", utm.northing.round()),
            format!("{:.0}", utm.easting.round()),
            CoordSystem::Utm32.datum_label(),
        ),
        _ => (
            format!("{:.6}", ctx.position.lat),
            format!("{:.6}", ctx.position.lon),
            CoordSystem::Wgs84.datum_label(),
        ),
    }
}

/// Fills the form from a find. Never fails; see the report for skipped fields.
pub fn populate(
    form: &mut AcroForm<'_>,
    record: &FindRecord,
    ctx: Option<&LocationContext>,
    today: NaiveDate,
) -> PopulateReport {
    let mut p = Populator {
        form,
        report: PopulateReport::default(),
    };
    let address_lookup = ctx.and_then(|c| c.address.as_ref());
    let municipality_lookup = ctx.and_then(|c| c.municipality.as_ref());

    // finder
    let finder = &record.finder;
    p.contact(FieldKey::FinderName, &finder.name);
    p.address(
        [FieldKey::FinderAddress, FieldKey::FinderPostalCode, FieldKey::FinderPlace],
        &parse_combined_address(&finder.address),
    );
    p.contact(FieldKey::FinderPhone, &finder.phone);
    p.contact(FieldKey::FinderEmail, &finder.email);

    // landowner; the registry address wins over free text
    let owner = &record.owner;
    p.contact(FieldKey::OwnerName, &owner.name);
    let owner_address = match address_lookup {
        Some(found) => AddressParts {
            street: found.street_text.clone(),
            postal_code: found.postal_code.clone(),
            place: found.postal_place.clone(),
        },
        None => parse_combined_address(&owner.address),
    };
    p.address(
        [FieldKey::OwnerAddress, FieldKey::OwnerPostalCode, FieldKey::OwnerPlace],
        &owner_address,
    );
    p.contact(FieldKey::OwnerPhone, &owner.phone);
    p.contact(FieldKey::OwnerEmail, &owner.email);
    p.checkbox(CheckboxKey::OwnerPermission, !owner.name.trim().is_empty());

    // object
    p.text(FieldKey::ObjectName, &record.object.name);
    if let Some(depth) = record.depth_display() {
        p.text(FieldKey::Depth, &depth);
    }

    // position
    if let Some(ctx) = ctx {
        let (north, east, datum) = gps_values(ctx);
        p.text(FieldKey::GpsNorth, &north);
        p.text(FieldKey::GpsEast, &east);
        p.text(FieldKey::Datum, datum);
    }

    // county comes only from the municipality lookup
    if let Some(found) = municipality_lookup {
        p.text(FieldKey::County, &found.county_name);
    }
    let municipality = first_filled([
        owner.kommune.as_str(),
        municipality_lookup.map_or("", |m| m.municipality_name.as_str()),
        address_lookup.map_or("", |a| a.municipality_name.as_str()),
    ]);
    p.text(FieldKey::Municipality, municipality);

    let gnr = first_filled([
        owner.gnr.as_str(),
        address_lookup.map_or("", |a| a.farm_number.as_str()),
    ]);
    let bnr = first_filled([
        owner.bnr.as_str(),
        address_lookup.map_or("", |a| a.holding_number.as_str()),
    ]);
    p.text(FieldKey::FarmHolding, &farm_holding(gnr, bnr));

    p.text(FieldKey::FindDate, &today.format("%Y-%m-%d").to_string());
    p.text(FieldKey::OtherInfo, &other_info(record));

    p.checkbox(CheckboxKey::MobileDevice, true);
    if let Some(area) = map_arealtype(&record.arealtype) {
        p.checkbox(CheckboxKey::Area(area), true);
    }

    p.report
}
