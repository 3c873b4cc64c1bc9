use std::io::Cursor;

/// EXIF orientation tag (1-8) of an in-memory photo, if it has one
pub fn read_orientation(bytes: &[u8]) -> Option<u32> {
    let exif_reader = exif::Reader::new();
    let exif = exif_reader
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;

    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    match field.value.get_uint(0) {
        Some(v @ 1..=8) => Some(v),
        _ => None,
    }
}
