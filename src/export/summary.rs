//! Summary and photo pages
//!
//! Builds the text of the summary page, then renders a planned layout into
//! new lopdf pages appended after the form.

use super::images::DecodedPhoto;
use encoding_rs::WINDOWS_1252;
use funnskjema_common::layout::{DrawOp, PAGE_HEIGHT_PT, PAGE_WIDTH_PT};
use funnskjema_common::{format_location, FindRecord, LocationContext, SummaryContent, SummaryPlan};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::HashMap;

const FONT_RESOURCE: &str = "F1";

/// Location line: the typed text when present, else the resolved position
pub fn location_display(record: &FindRecord, ctx: Option<&LocationContext>) -> String {
    let typed = record.location_text.trim();
    if !typed.is_empty() {
        return typed.to_string();
    }
    ctx.map(|c| format_location(c.position.lat, c.position.lon, c.system))
        .unwrap_or_default()
}

/// Title, label lines and notes in display order
pub fn build_summary_content(record: &FindRecord, ctx: Option<&LocationContext>) -> SummaryContent {
    let labels = record.lang.labels();
    let line = |label: &str, value: &str| (label.to_string(), value.trim().to_string());

    SummaryContent {
        title: labels.title.to_string(),
        lines: vec![
            line(labels.object, &record.object.name),
            line(labels.object_type, &record.object.kind),
            line(labels.material, &record.object.material),
            line(labels.age, &record.object.age),
            line(labels.area, &record.arealtype),
            line(labels.depth, &record.depth_display().unwrap_or_default()),
            line(labels.location, &location_display(record, ctx)),
            line(labels.finder_name, &record.finder.name),
            line(labels.finder_email, &record.finder.email),
            line(labels.owner_name, &record.owner.name),
            line(labels.owner_email, &record.owner.email),
        ],
        notes_header: format!("{}:", labels.notes),
        notes: record.notes.clone(),
    }
}

/// Helvetica WinAnsi bytes; characters outside Windows-1252 become '?'
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        let (bytes, _, had_errors) = WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        if had_errors || bytes.len() != 1 {
            out.push(b'?');
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    out
}

fn real(value: f32) -> Object {
    Object::Real(value)
}

fn text_ops(x: f32, y: f32, size: f32, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(FONT_RESOURCE.into()), real(size)]),
        Operation::new("Td", vec![real(x), real(y)]),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

/// Draws an image XObject into the box (x, y, width, height). A rotated image
/// is turned a quarter clockwise so its top edge faces right.
fn image_ops(resource: &str, x: f32, y: f32, width: f32, height: f32, rotated: bool) -> Vec<Operation> {
    let matrix = if rotated {
        vec![real(0.0), real(-height), real(width), real(0.0), real(x), real(y + height)]
    } else {
        vec![real(width), real(0.0), real(0.0), real(height), real(x), real(y)]
    };
    vec![
        Operation::new("q", vec![]),
        Operation::new("cm", matrix),
        Operation::new("Do", vec![Object::Name(resource.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

fn image_stream(photo: &DecodedPhoto) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => photo.width_px as i64,
            "Height" => photo.height_px as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        photo.jpeg.clone(),
    )
    .with_compression(false)
}

fn pages_root(doc: &Document) -> Result<ObjectId, String> {
    doc.catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(|pages| pages.as_reference())
        .map_err(|e| format!("page tree not found: {}", e))
}

/// Appends the planned pages. Returns the number of pages added.
pub fn append_pages(
    doc: &mut Document,
    plan: &SummaryPlan,
    photos: &[DecodedPhoto],
) -> Result<usize, String> {
    let pages_id = pages_root(doc)?;
    let by_number: HashMap<usize, &DecodedPhoto> = photos.iter().map(|p| (p.number, p)).collect();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut new_pages = Vec::with_capacity(plan.pages.len());
    for page in &plan.pages {
        let mut operations = Vec::new();
        let mut xobjects = Dictionary::new();

        for op in &page.ops {
            match op {
                DrawOp::Text { x, y, size, text } => {
                    operations.extend(text_ops(*x, *y, *size, text));
                }
                DrawOp::Image { number, x, y, width, height, rotated } => {
                    let Some(photo) = by_number.get(number) else {
                        log::warn!("no decoded data for photo {}, leaving its slot empty", number);
                        continue;
                    };
                    let resource = format!("Im{}", number);
                    let image_id = doc.add_object(image_stream(photo));
                    xobjects.set(resource.as_str(), image_id);
                    operations.extend(image_ops(&resource, *x, *y, *width, *height, *rotated));
                }
            }
        }

        let content = Content { operations }
            .encode()
            .map_err(|e| format!("page content encoding failed: {}", e))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                real(PAGE_WIDTH_PT),
                real(PAGE_HEIGHT_PT),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { FONT_RESOURCE => font_id },
                "XObject" => xobjects,
            },
        });
        new_pages.push(page_id);
    }

    let pages = doc
        .get_object_mut(pages_id)
        .and_then(|o| o.as_dict_mut())
        .map_err(|e| format!("page tree unreadable: {}", e))?;
    let count = pages.get(b"Count").and_then(|c| c.as_i64()).unwrap_or(0);
    let kids = pages
        .get_mut(b"Kids")
        .and_then(|o| o.as_array_mut())
        .map_err(|e| format!("page tree has no kids: {}", e))?;
    kids.extend(new_pages.iter().map(|id| Object::Reference(*id)));
    pages.set("Count", count + new_pages.len() as i64);

    Ok(new_pages.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use funnskjema_common::{plan_summary, CoordSystem, LatLon, Lang, PhotoSize};

    fn one_page_doc() -> Document {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! { "Type" => "Page", "Parent" => pages_id });
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
        doc
    }

    fn photo(number: usize) -> DecodedPhoto {
        DecodedPhoto {
            number,
            source: format!("{}.jpg", number),
            native_width: 400,
            native_height: 300,
            jpeg: vec![0xFF, 0xD8, 0xFF, 0xD9],
            width_px: 400,
            height_px: 300,
        }
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("Åker"), vec![0xC5, b'k', b'e', b'r']);
        assert_eq!(encode_win_ansi("ø€"), vec![0xF8, 0x80]);
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn test_summary_lines_order() {
        let mut record = FindRecord {
            lang: Lang::En,
            depth: "20".into(),
            arealtype: "Skog".into(),
            ..Default::default()
        };
        record.object.name = "Spenne".into();
        record.owner.email = "eier@example.no".into();
        let content = build_summary_content(&record, None);

        let labels: Vec<&str> = content.lines.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Object",
                "Type",
                "Assumed material",
                "Estimated age",
                "Area type",
                "Find depth",
                "Location (GPS)",
                "Finder",
                "Finder email",
                "Land owner",
                "Owner email"
            ]
        );
        assert_eq!(content.lines[0].1, "Spenne");
        assert_eq!(content.lines[4].1, "Skog");
        assert_eq!(content.lines[5].1, "20 cm");
        assert_eq!(content.lines[10].1, "eier@example.no");
        assert_eq!(content.notes_header, "Notes:");
    }

    #[test]
    fn test_location_display() {
        let record = FindRecord::default();
        assert_eq!(location_display(&record, None), "");

        let ctx = LocationContext::new(LatLon { lat: 69.65, lon: 20.5 }, CoordSystem::Utm32);
        assert_eq!(location_display(&record, Some(&ctx)), "Lat: 69.650000, Lon: 20.500000");

        let typed = FindRecord {
            location_text: "N: 6651411, E: 500000".into(),
            ..Default::default()
        };
        assert_eq!(location_display(&typed, Some(&ctx)), "N: 6651411, E: 500000");
    }

    #[test]
    fn test_append_pages_updates_page_tree() {
        let mut doc = one_page_doc();
        let record = FindRecord { lang: Lang::En, ..Default::default() };
        let content = build_summary_content(&record, None);
        let sizes: Vec<PhotoSize> = (1..=3).map(|n| photo(n).layout_size()).collect();
        let plan = plan_summary(&content, &sizes, record.lang.labels());
        let photos: Vec<DecodedPhoto> = (1..=3).map(photo).collect();

        let added = append_pages(&mut doc, &plan, &photos).unwrap();
        assert_eq!(added, plan.pages.len());
        assert_eq!(doc.get_pages().len(), 1 + added);

        let images = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .filter(|s| s.dict.get(b"Subtype").and_then(|o| o.as_name()).ok() == Some(b"Image".as_slice()))
            .count();
        assert_eq!(images, 3);
    }

    #[test]
    fn test_missing_photo_leaves_slot_empty() {
        let mut doc = one_page_doc();
        let record = FindRecord::default();
        let content = build_summary_content(&record, None);
        let plan = plan_summary(&content, &[photo(1).layout_size()], record.lang.labels());

        let added = append_pages(&mut doc, &plan, &[]).unwrap();
        assert_eq!(added, plan.pages.len());
    }

    #[test]
    fn test_document_without_page_tree() {
        let mut doc = Document::with_version("1.7");
        let catalog = doc.add_object(dictionary! { "Type" => "Catalog" });
        doc.trailer.set("Root", catalog);
        assert!(append_pages(&mut doc, &SummaryPlan::default(), &[]).is_err());
    }
}
