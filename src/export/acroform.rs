//! Low-level AcroForm access on a lopdf document
//!
//! Fields are indexed by fully qualified name ("parent.child"). Every write
//! returns `Result<Written, Skipped>` so callers can record a skipped field
//! and move on.

use super::summary::encode_win_ansi;
use encoding_rs::{UTF_16BE, WINDOWS_1252};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use std::fmt;

const OFF_STATE: &[u8] = b"Off";

/// A write that went through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Written {
    Text(String),
    Checkbox(bool),
}

/// A write that did not happen. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skipped {
    /// No field with that name in the template
    Missing,
    WrongType { expected: &'static str, found: String },
    /// Checkbox without an appearance state other than Off
    NoOnState,
    /// Field object unreadable
    Broken(String),
}

impl fmt::Display for Skipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skipped::Missing => write!(f, "field not in template"),
            Skipped::WrongType { expected, found } => {
                write!(f, "expected {} field, found {}", expected, found)
            }
            Skipped::NoOnState => write!(f, "checkbox has no on state"),
            Skipped::Broken(reason) => write!(f, "field unreadable: {}", reason),
        }
    }
}

/// Where the AcroForm dictionary lives
#[derive(Debug, Clone, Copy)]
enum FormLocation {
    Indirect(ObjectId),
    InCatalog(ObjectId),
}

#[derive(Debug, Clone)]
struct FieldEntry {
    id: ObjectId,
    /// FT, inherited from ancestors when absent
    field_type: Option<Vec<u8>>,
    /// Widget annotations; the field itself when field and widget are merged
    widgets: Vec<ObjectId>,
}

pub struct AcroForm<'a> {
    doc: &'a mut Document,
    location: FormLocation,
    fields: BTreeMap<String, FieldEntry>,
}

impl<'a> AcroForm<'a> {
    /// Indexes the form fields. `Err` means the document has no usable AcroForm.
    pub fn new(doc: &'a mut Document) -> Result<Self, String> {
        let location = locate_form(doc)?;
        let fields = collect_fields(doc, location)?;
        Ok(Self {
            doc,
            location,
            fields,
        })
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    fn entry(&self, name: &str, expected: &'static str) -> Result<FieldEntry, Skipped> {
        let entry = self.fields.get(name).ok_or(Skipped::Missing)?;
        match entry.field_type.as_deref() {
            Some(ft) if ft == expected.as_bytes() => Ok(entry.clone()),
            other => Err(Skipped::WrongType {
                expected,
                found: other
                    .map(|ft| String::from_utf8_lossy(ft).into_owned())
                    .unwrap_or_else(|| "none".into()),
            }),
        }
    }

    fn field_dict_mut(&mut self, id: ObjectId) -> Result<&mut Dictionary, Skipped> {
        self.doc
            .get_object_mut(id)
            .and_then(|o| o.as_dict_mut())
            .map_err(|e| Skipped::Broken(e.to_string()))
    }

    /// Sets a text field's value
    pub fn set_text(&mut self, name: &str, value: &str) -> Result<Written, Skipped> {
        let entry = self.entry(name, "Tx")?;
        let dict = self.field_dict_mut(entry.id)?;
        dict.set("V", text_string(value));
        Ok(Written::Text(value.to_string()))
    }

    /// Sets a checkbox to its on state or to Off, on `/V` and every widget's `/AS`
    pub fn set_checkbox(&mut self, name: &str, checked: bool) -> Result<Written, Skipped> {
        let entry = self.entry(name, "Btn")?;
        let state = if checked {
            on_state(self.doc, &entry.widgets).ok_or(Skipped::NoOnState)?
        } else {
            OFF_STATE.to_vec()
        };

        self.field_dict_mut(entry.id)?
            .set("V", Object::Name(state.clone()));
        for widget in &entry.widgets {
            self.field_dict_mut(*widget)?
                .set("AS", Object::Name(state.clone()));
        }
        Ok(Written::Checkbox(checked))
    }

    /// Clears the checkbox, then sets the wanted state. Leaves no stale
    /// on-state from the template behind.
    pub fn force_checkbox(&mut self, name: &str, checked: bool) -> Result<Written, Skipped> {
        self.set_checkbox(name, false)?;
        if checked {
            self.set_checkbox(name, true)
        } else {
            Ok(Written::Checkbox(false))
        }
    }

    /// Rebuilds the normal appearance of every filled text widget from its
    /// `/Rect`, `/DA` and value, and sets `NeedAppearances` for viewers that
    /// regenerate them anyway
    pub fn finalize_appearances(&mut self) -> Result<(), String> {
        let form = form_dict(self.doc, self.location)?;
        let form_da = form
            .get(b"DA")
            .and_then(|o| o.as_str())
            .ok()
            .map(<[u8]>::to_vec);
        let form_fonts = form
            .get(b"DR")
            .ok()
            .and_then(|dr| resolve_dict(self.doc, dr))
            .and_then(|dr| dr.get(b"Font").ok())
            .cloned();

        let mut plans = Vec::new();
        let mut stale = Vec::new();
        for entry in self.fields.values() {
            if entry.field_type.as_deref() != Some(b"Tx".as_slice()) {
                continue;
            }
            let Ok(field) = self.doc.get_dictionary(entry.id) else {
                continue;
            };
            let Some(value) = field.get(b"V").and_then(|v| v.as_str()).ok().map(decode_text) else {
                continue;
            };
            let multiline = value.contains('\n')
                || field
                    .get(b"Ff")
                    .and_then(|f| f.as_i64())
                    .is_ok_and(|flags| flags & MULTILINE_FLAG != 0);

            for widget in &entry.widgets {
                let Ok(dict) = self.doc.get_dictionary(*widget) else {
                    continue;
                };
                let Some((width, height)) = dict.get(b"Rect").ok().and_then(rect_size) else {
                    stale.push(*widget);
                    continue;
                };
                let da = dict
                    .get(b"DA")
                    .or_else(|_| field.get(b"DA"))
                    .and_then(|o| o.as_str())
                    .ok()
                    .map(<[u8]>::to_vec)
                    .or_else(|| form_da.clone())
                    .unwrap_or_else(|| DEFAULT_DA.to_vec());
                plans.push(AppearancePlan {
                    widget: *widget,
                    width,
                    height,
                    da,
                    value: value.clone(),
                    multiline,
                });
            }
        }

        let mut fallback_font = None;
        for plan in plans {
            let (operations, font_name) = appearance_operations(&plan);
            let fonts = match &form_fonts {
                Some(fonts) => fonts.clone(),
                None => {
                    let font_id = *fallback_font.get_or_insert_with(|| {
                        self.doc.add_object(dictionary! {
                            "Type" => "Font",
                            "Subtype" => "Type1",
                            "BaseFont" => "Helvetica",
                            "Encoding" => "WinAnsiEncoding",
                        })
                    });
                    let mut fonts = Dictionary::new();
                    fonts.set(font_name, font_id);
                    Object::Dictionary(fonts)
                }
            };
            let content = Content { operations }
                .encode()
                .map_err(|e| format!("appearance encoding failed: {}", e))?;
            let stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(plan.width),
                        Object::Real(plan.height),
                    ],
                    "Resources" => dictionary! { "Font" => fonts },
                },
                content,
            );
            let appearance = self.doc.add_object(stream);
            if let Ok(widget) = self.doc.get_object_mut(plan.widget).and_then(|o| o.as_dict_mut()) {
                widget.set("AP", dictionary! { "N" => appearance });
            }
        }

        for id in stale {
            if let Ok(dict) = self.doc.get_object_mut(id).and_then(|o| o.as_dict_mut()) {
                dict.remove(b"AP");
            }
        }

        form_dict_mut(self.doc, self.location)?.set("NeedAppearances", true);
        Ok(())
    }
}

/// Field flag bit 13
const MULTILINE_FLAG: i64 = 1 << 12;
const DEFAULT_DA: &[u8] = b"/Helv 0 Tf 0 g";
const DEFAULT_FONT: &[u8] = b"Helv";
const PADDING: f32 = 2.0;

/// One text widget's appearance, gathered before the document is mutated
struct AppearancePlan {
    widget: ObjectId,
    width: f32,
    height: f32,
    da: Vec<u8>,
    value: String,
    multiline: bool,
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Width and height of a `/Rect`; either corner order
fn rect_size(rect: &Object) -> Option<(f32, f32)> {
    let corners: Vec<f32> = rect.as_array().ok()?.iter().filter_map(number).collect();
    let [x1, y1, x2, y2] = corners.as_slice() else {
        return None;
    };
    let size = ((x2 - x1).abs(), (y2 - y1).abs());
    (size.0 > 0.0 && size.1 > 0.0).then_some(size)
}

/// Content of a text widget appearance. Returns the operations and the font
/// resource name they use.
fn appearance_operations(plan: &AppearancePlan) -> (Vec<Operation>, Vec<u8>) {
    let mut da_ops = Content::decode(&plan.da)
        .map(|c| c.operations)
        .unwrap_or_default();
    if !da_ops.iter().any(|op| op.operator == "Tf") {
        da_ops.insert(
            0,
            Operation::new("Tf", vec![Object::Name(DEFAULT_FONT.to_vec()), Object::Integer(0)]),
        );
    }

    let lines: Vec<&str> = if plan.multiline {
        plan.value.lines().collect()
    } else {
        vec![plan.value.as_str()]
    };
    let auto_size = if plan.multiline {
        10.0
    } else {
        ((plan.height - 2.0 * PADDING) * 0.75).clamp(4.0, 12.0)
    };

    let mut font_name = DEFAULT_FONT.to_vec();
    let mut size = auto_size;
    for op in da_ops.iter_mut().filter(|op| op.operator == "Tf") {
        if let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) {
            font_name = name.to_vec();
        }
        match op.operands.get(1).and_then(number) {
            Some(given) if given > 0.0 => size = given,
            _ => {}
        }
        op.operands = vec![Object::Name(font_name.clone()), Object::Real(size)];
    }

    let leading = size * 1.15;
    let first_baseline = if plan.multiline {
        plan.height - PADDING - size
    } else {
        (plan.height - size) / 2.0 + size * 0.22
    };

    let mut operations = vec![
        Operation::new("BMC", vec![Object::Name(b"Tx".to_vec())]),
        Operation::new("q", vec![]),
        Operation::new(
            "re",
            vec![
                Object::Real(PADDING / 2.0),
                Object::Real(PADDING / 2.0),
                Object::Real(plan.width - PADDING),
                Object::Real(plan.height - PADDING),
            ],
        ),
        Operation::new("W", vec![]),
        Operation::new("n", vec![]),
        Operation::new("BT", vec![]),
    ];
    operations.extend(da_ops);
    for (index, line) in lines.iter().enumerate() {
        let (dx, dy) = if index == 0 {
            (PADDING, first_baseline)
        } else {
            (0.0, -leading)
        };
        operations.push(Operation::new("Td", vec![Object::Real(dx), Object::Real(dy)]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(line), StringFormat::Literal)],
        ));
    }
    operations.extend([
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
        Operation::new("EMC", vec![]),
    ]);
    (operations, font_name)
}

fn locate_form(doc: &Document) -> Result<FormLocation, String> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(|o| o.as_reference())
        .map_err(|e| format!("no document catalog: {}", e))?;
    let catalog = doc
        .get_dictionary(catalog_id)
        .map_err(|e| format!("catalog unreadable: {}", e))?;

    match catalog.get(b"AcroForm") {
        Ok(Object::Reference(id)) => Ok(FormLocation::Indirect(*id)),
        Ok(Object::Dictionary(_)) => Ok(FormLocation::InCatalog(catalog_id)),
        Ok(_) => Err("AcroForm entry is not a dictionary".into()),
        Err(_) => Err("document has no AcroForm".into()),
    }
}

fn form_dict(doc: &Document, location: FormLocation) -> Result<&Dictionary, String> {
    match location {
        FormLocation::Indirect(id) => doc.get_dictionary(id).map_err(|e| e.to_string()),
        FormLocation::InCatalog(catalog_id) => doc
            .get_dictionary(catalog_id)
            .and_then(|c| c.get(b"AcroForm"))
            .and_then(|o| o.as_dict())
            .map_err(|e| e.to_string()),
    }
}

fn form_dict_mut(doc: &mut Document, location: FormLocation) -> Result<&mut Dictionary, String> {
    match location {
        FormLocation::Indirect(id) => doc
            .get_object_mut(id)
            .and_then(|o| o.as_dict_mut())
            .map_err(|e| e.to_string()),
        FormLocation::InCatalog(catalog_id) => doc
            .get_object_mut(catalog_id)
            .and_then(|o| o.as_dict_mut())
            .and_then(|c| c.get_mut(b"AcroForm"))
            .and_then(|o| o.as_dict_mut())
            .map_err(|e| e.to_string()),
    }
}

fn collect_fields(
    doc: &Document,
    location: FormLocation,
) -> Result<BTreeMap<String, FieldEntry>, String> {
    let roots: Vec<ObjectId> = form_dict(doc, location)?
        .get(b"Fields")
        .and_then(|o| o.as_array())
        .map(|fields| fields.iter().filter_map(|f| f.as_reference().ok()).collect())
        .unwrap_or_default();

    let mut fields = BTreeMap::new();
    for id in roots {
        walk_field(doc, id, "", None, &mut fields, 0);
    }
    Ok(fields)
}

/// Guards against reference cycles in malformed field trees
const MAX_FIELD_DEPTH: usize = 32;

fn walk_field(
    doc: &Document,
    id: ObjectId,
    parent_name: &str,
    parent_type: Option<&[u8]>,
    out: &mut BTreeMap<String, FieldEntry>,
    depth: usize,
) {
    if depth > MAX_FIELD_DEPTH {
        log::warn!("form field tree deeper than {}, ignoring the rest", MAX_FIELD_DEPTH);
        return;
    }
    let Ok(dict) = doc.get_dictionary(id) else {
        log::warn!("form field {:?} unreadable", id);
        return;
    };

    let partial = dict.get(b"T").ok().and_then(|t| t.as_str().ok()).map(decode_text);
    let name = match (&partial, parent_name.is_empty()) {
        (Some(partial), true) => partial.clone(),
        (Some(partial), false) => format!("{}.{}", parent_name, partial),
        (None, _) => parent_name.to_string(),
    };
    let field_type = dict
        .get(b"FT")
        .ok()
        .and_then(|ft| ft.as_name().ok())
        .or(parent_type);

    let kids: Vec<ObjectId> = dict
        .get(b"Kids")
        .and_then(|o| o.as_array())
        .map(|kids| kids.iter().filter_map(|k| k.as_reference().ok()).collect())
        .unwrap_or_default();

    let (child_fields, widgets): (Vec<ObjectId>, Vec<ObjectId>) =
        kids.into_iter().partition(|kid| {
            doc.get_dictionary(*kid)
                .map(|k| k.has(b"T"))
                .unwrap_or(false)
        });

    let has_child_fields = !child_fields.is_empty();
    for child in child_fields {
        walk_field(doc, child, &name, field_type, out, depth + 1);
    }

    let is_terminal = partial.is_some() && (!widgets.is_empty() || !has_child_fields);
    if !is_terminal || out.contains_key(&name) {
        return;
    }
    let widgets = if widgets.is_empty() { vec![id] } else { widgets };
    out.insert(
        name,
        FieldEntry {
            id,
            field_type: field_type.map(<[u8]>::to_vec),
            widgets,
        },
    );
}

/// Name of the first appearance state other than Off
fn on_state(doc: &Document, widgets: &[ObjectId]) -> Option<Vec<u8>> {
    widgets.iter().find_map(|id| {
        let widget = doc.get_dictionary(*id).ok()?;
        let appearance = resolve_dict(doc, widget.get(b"AP").ok()?)?;
        let normal = resolve_dict(doc, appearance.get(b"N").ok()?)?;
        normal
            .iter()
            .map(|(key, _)| key)
            .find(|key| key.as_slice() != OFF_STATE)
            .cloned()
    })
}

fn resolve_dict<'d>(doc: &'d Document, object: &'d Object) -> Option<&'d Dictionary> {
    match object {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// PDF text string: plain bytes for ASCII, UTF-16BE with BOM otherwise
pub fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::String(value.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Decodes a PDF text string (UTF-16BE with BOM, else PDFDocEncoding ~ Windows-1252)
pub fn decode_text(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => UTF_16BE.decode_without_bom_handling(rest).0.into_owned(),
        _ => WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned(),
    }
}

/// Current value of every field: text as written, checkboxes as their state name
pub fn field_values(doc: &Document) -> BTreeMap<String, String> {
    let Ok(location) = locate_form(doc) else {
        return BTreeMap::new();
    };
    let Ok(fields) = collect_fields(doc, location) else {
        return BTreeMap::new();
    };

    fields
        .into_iter()
        .filter_map(|(name, entry)| {
            let dict = doc.get_dictionary(entry.id).ok()?;
            let value = match dict.get(b"V").ok()? {
                Object::String(bytes, _) => decode_text(bytes),
                Object::Name(state) => String::from_utf8_lossy(state).into_owned(),
                _ => return None,
            };
            Some((name, value))
        })
        .collect()
}
