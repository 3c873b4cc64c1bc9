//! Shared fixtures: an in-memory form template, photos and a scripted lookup

#![allow(dead_code)]

use funnskjema::export::acroform::text_string;
use funnskjema::geo::LocationLookup;
use funnskjema_common::{AddressLookupResult, LatLon, MunicipalityLookupResult, FIELD_BINDINGS};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Cursor;
use std::time::Duration;

fn rect(y: i64) -> Object {
    Object::Array(vec![
        Object::Integer(50),
        Object::Integer(y),
        Object::Integer(300),
        Object::Integer(y + 14),
    ])
}

/// Checkbox names as they appear in the published form
pub const TEMPLATE_CHECKBOXES: [&str; 9] = [
    "Grunneier har gitt tillatelse _y87rRhfj6A5hS8oITp7knw",
    "Check Box12",
    "Check Box9",
    "Check Box4",
    "Check Box11",
    "Check Box5",
    "Check Box6",
    "Check Box7",
    "Check Box10",
];

/// Text fields that carry a leftover value in the template
pub const PRESET_VALUE: (&str, &str) = ("Telefonnummer grunneier", "99999999");

/// Single-page form with every template field, minus `omit`
pub fn template_pdf(omit: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();
    let mut fields: Vec<ObjectId> = Vec::new();
    let mut y = 800;

    for (_, name) in FIELD_BINDINGS {
        if omit.contains(name) {
            continue;
        }
        let appearance = doc.add_object(Stream::new(dictionary! {}, b"/Tx BMC EMC".to_vec()));
        let mut field = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => text_string(name),
            "Rect" => rect(y),
            "P" => page_id,
            "DA" => Object::string_literal("/Helv 10 Tf 0 g"),
            "AP" => dictionary! { "N" => appearance },
        };
        if *name == PRESET_VALUE.0 {
            field.set("V", text_string(PRESET_VALUE.1));
        }
        fields.push(doc.add_object(field));
        y -= 20;
    }

    for name in TEMPLATE_CHECKBOXES {
        if omit.contains(&name) {
            continue;
        }
        let on = doc.add_object(Stream::new(dictionary! {}, b"0 g".to_vec()));
        let off = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        fields.push(doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Btn",
            "T" => text_string(name),
            "Rect" => rect(y),
            "P" => page_id,
            "V" => "Off",
            "AS" => "Off",
            "AP" => dictionary! { "N" => dictionary! { "Yes" => on, "Off" => off } },
        }));
        y -= 20;
    }

    let refs: Vec<Object> = fields.iter().map(|id| Object::Reference(*id)).collect();
    let content = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
            "Contents" => content,
            "Annots" => refs.clone(),
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let acroform = doc.add_object(dictionary! {
        "Fields" => refs,
        "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
    });
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => acroform,
    });
    doc.trailer.set("Root", catalog);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Valid one-page PDF without an AcroForm
pub fn plain_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let text = b"BT /F1 12 Tf 72 720 Td (Funnskjema) Tj ET".to_vec();
    let content = doc.add_object(Stream::new(dictionary! {}, text));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(595),
            Object::Integer(842),
        ],
        "Contents" => content,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn solid(width: u32, height: u32) -> DynamicImage {
    let img: RgbImage = ImageBuffer::from_pixel(width, height, Rgb([90, 120, 60]));
    DynamicImage::ImageRgb8(img)
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    solid(width, height)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    solid(width, height)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

/// Number of image XObjects in a document
pub fn image_count(doc: &Document) -> usize {
    doc.objects
        .values()
        .filter_map(|o| o.as_stream().ok())
        .filter(|s| {
            s.dict.get(b"Subtype").and_then(|o| o.as_name()).ok() == Some(b"Image".as_slice())
        })
        .count()
}

/// Raw content stream of every page, in page order
pub fn page_contents(doc: &Document) -> Vec<Vec<u8>> {
    doc.get_pages()
        .values()
        .map(|id| doc.get_page_content(*id).unwrap_or_default())
        .collect()
}

pub fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_bytes())
}

pub fn oslo_address() -> AddressLookupResult {
    AddressLookupResult {
        street_text: "Storgata 5".into(),
        postal_code: "0155".into(),
        postal_place: "OSLO".into(),
        municipality_name: "OSLO".into(),
        farm_number: "207".into(),
        holding_number: "45".into(),
        distance_meters: Some(12.0),
        point: Some(LatLon { lat: 59.9139, lon: 10.7522 }),
    }
}

pub fn oslo_municipality() -> MunicipalityLookupResult {
    MunicipalityLookupResult {
        county_name: "Oslo".into(),
        county_number: "03".into(),
        municipality_name: "Oslo".into(),
        municipality_number: "0301".into(),
    }
}

/// Lookup with fixed answers and an optional delay
#[derive(Debug, Clone, Default)]
pub struct ScriptedLookup {
    pub address: Option<AddressLookupResult>,
    pub municipality: Option<MunicipalityLookupResult>,
    pub delay: Option<Duration>,
}

impl ScriptedLookup {
    pub fn oslo() -> Self {
        Self {
            address: Some(oslo_address()),
            municipality: Some(oslo_municipality()),
            delay: None,
        }
    }

    async fn wait(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl LocationLookup for ScriptedLookup {
    async fn resolve_address(&self, _lat: f64, _lon: f64) -> Option<AddressLookupResult> {
        self.wait().await;
        self.address.clone()
    }

    async fn resolve_municipality(&self, _lat: f64, _lon: f64) -> Option<MunicipalityLookupResult> {
        self.wait().await;
        self.municipality.clone()
    }
}
