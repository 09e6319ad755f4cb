//! Byte-level builders shared by the unit tests. The crate has no write
//! path; these emit just enough of the wire format to exercise the decode
//! side.

use byteorder::{BigEndian, WriteBytesExt};

use crate::record::{BYTE_COUNT_MASK, NEW_CLASS_TAG};

/// Length-prefixed string bytes (short or `0xFF` + 4-byte form).
pub fn wstring(s: &str) -> Vec<u8> {
    let mut out = Vec::new();
    if s.len() < 255 {
        out.push(s.len() as u8);
    } else {
        out.push(0xFF);
        out.write_u32::<BigEndian>(s.len() as u32).unwrap();
    }
    out.extend_from_slice(s.as_bytes());
    out
}

/// One framed record: byte-count word, version, body.
pub fn record(version: u16, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_u32::<BigEndian>(BYTE_COUNT_MASK | (body.len() as u32 + 2))
        .unwrap();
    out.write_u16::<BigEndian>(version).unwrap();
    out.extend_from_slice(body);
    out
}

/// The embedded base-object fields with the referenced bit clear.
pub fn object_header() -> Vec<u8> {
    vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
}

/// A complete framed named record.
pub fn named_record(name: &str, title: &str) -> Vec<u8> {
    let mut body = object_header();
    body.extend_from_slice(&wstring(name));
    body.extend_from_slice(&wstring(title));
    record(1, &body)
}

/// A polymorphic object written with a full class name: byte-count word,
/// new-class sentinel, NUL-terminated class name, then the record itself.
pub fn new_class_object(class: &str, rec: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let byte_count = 4 + class.len() as u32 + 1 + rec.len() as u32;
    out.write_u32::<BigEndian>(BYTE_COUNT_MASK | byte_count).unwrap();
    out.write_u32::<BigEndian>(NEW_CLASS_TAG).unwrap();
    out.extend_from_slice(class.as_bytes());
    out.push(0);
    out.extend_from_slice(rec);
    out
}
