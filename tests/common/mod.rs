//! Byte-level builder for synthetic container files.
//!
//! The crate ships no write path, so the tests assemble files by hand:
//! fixed header, identity key at `begin`, directory records, object
//! records, and key tables, in the same layout the decoder walks. Offsets
//! for directory records are patched in after their key tables are placed.

#![allow(dead_code)]

use byteorder::{BigEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

pub const BEG: u64 = 100;

/// 2024-03-15 12:30:45 in the packed calendar encoding.
pub const DATIME: u32 = (29 << 26) | (3 << 22) | (15 << 17) | (12 << 12) | (30 << 6) | 45;

const BYTE_COUNT_MASK: u32 = 0x4000_0000;
const NEW_CLASS_TAG: u32 = 0xFFFF_FFFF;

// ── record-level builders ────────────────────────────────────────────────────

/// Length-prefixed string bytes.
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

/// A complete framed named record.
pub fn named_record(name: &str, title: &str) -> Vec<u8> {
    let mut body = vec![0u8; 10]; // id, bits (referenced clear), filler
    body.extend_from_slice(&wstring(name));
    body.extend_from_slice(&wstring(title));
    record(1, &body)
}

/// A polymorphic object written with a full class name.
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

/// Wrap plaintext in the 9-byte compression envelope.
pub fn zl_envelope(plain: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(plain).unwrap();
    let deflated = enc.finish().unwrap();

    let mut out = Vec::with_capacity(9 + deflated.len());
    out.extend_from_slice(b"ZL");
    out.push(8);
    for size in [deflated.len() as u32, plain.len() as u32] {
        out.push(size as u8);
        out.push((size >> 8) as u8);
        out.push((size >> 16) as u8);
    }
    out.extend_from_slice(&deflated);
    out
}

// ── file-level builder ───────────────────────────────────────────────────────

pub enum Entry {
    Object {
        class: String,
        name: String,
        title: String,
        payload: Vec<u8>,
        compress: bool,
    },
    Dir {
        name: String,
        title: String,
        entries: Vec<Entry>,
    },
}

pub fn object(class: &str, name: &str, title: &str, payload: Vec<u8>) -> Entry {
    Entry::Object {
        class: class.to_owned(),
        name: name.to_owned(),
        title: title.to_owned(),
        payload,
        compress: false,
    }
}

pub fn compressed_object(class: &str, name: &str, title: &str, payload: Vec<u8>) -> Entry {
    Entry::Object {
        class: class.to_owned(),
        name: name.to_owned(),
        title: title.to_owned(),
        payload,
        compress: true,
    }
}

pub fn dir(name: &str, title: &str, entries: Vec<Entry>) -> Entry {
    Entry::Dir {
        name: name.to_owned(),
        title: title.to_owned(),
        entries,
    }
}

pub struct Builder {
    pub version: u32,
    pub file_name: String,
    pub file_title: String,
    pub identity_class: String,
    pub entries: Vec<Entry>,
}

struct PlannedKey {
    class: String,
    name: String,
    title: String,
    key_len: usize,
    nbytes: usize,
    obj_len: usize,
    seek_key: u64,
}

impl Builder {
    pub fn new(version: u32, file_name: &str) -> Self {
        Builder {
            version,
            file_name: file_name.to_owned(),
            file_title: String::new(),
            identity_class: "TFile".to_owned(),
            entries: Vec::new(),
        }
    }

    pub fn entry(mut self, e: Entry) -> Self {
        self.entries.push(e);
        self
    }

    pub fn identity_class(mut self, class: &str) -> Self {
        self.identity_class = class.to_owned();
        self
    }

    fn wide(&self) -> bool {
        self.version >= 1_000_000
    }

    fn key_version(&self) -> u16 {
        if self.wide() {
            1002
        } else {
            2
        }
    }

    fn dir_version(&self) -> u16 {
        if self.wide() {
            1005
        } else {
            5
        }
    }

    fn seek_width(&self) -> usize {
        if self.wide() {
            8
        } else {
            4
        }
    }

    fn key_header_len(&self, class: &str, name: &str, title: &str) -> usize {
        18 + 2 * self.seek_width()
            + wstring(class).len()
            + wstring(name).len()
            + wstring(title).len()
    }

    fn dir_record_len(&self) -> usize {
        18 + 3 * self.seek_width()
    }

    fn write_seek(&self, buf: &mut Vec<u8>, v: u64) {
        if self.wide() {
            buf.write_i64::<BigEndian>(v as i64).unwrap();
        } else {
            buf.write_i32::<BigEndian>(v as i32).unwrap();
        }
    }

    fn write_key(&self, buf: &mut Vec<u8>, k: &PlannedKey) {
        buf.write_u32::<BigEndian>(k.nbytes as u32).unwrap();
        buf.write_u16::<BigEndian>(self.key_version()).unwrap();
        buf.write_i32::<BigEndian>(k.obj_len as i32).unwrap();
        buf.write_u32::<BigEndian>(DATIME).unwrap();
        buf.write_u16::<BigEndian>(k.key_len as u16).unwrap();
        buf.write_u16::<BigEndian>(1).unwrap(); // cycle
        self.write_seek(buf, k.seek_key);
        self.write_seek(buf, BEG);
        buf.extend_from_slice(&wstring(&k.class));
        buf.extend_from_slice(&wstring(&k.name));
        buf.extend_from_slice(&wstring(&k.title));
    }

    fn write_dir_record(
        &self,
        buf: &mut [u8],
        at: usize,
        nbytes_keys: usize,
        nbytes_name: usize,
        seek_dir: u64,
        seek_parent: u64,
        seek_keys: u64,
    ) {
        let mut rec = Vec::new();
        rec.write_u16::<BigEndian>(self.dir_version()).unwrap();
        rec.write_u32::<BigEndian>(DATIME).unwrap();
        rec.write_u32::<BigEndian>(DATIME).unwrap();
        rec.write_u32::<BigEndian>(nbytes_keys as u32).unwrap();
        rec.write_u32::<BigEndian>(nbytes_name as u32).unwrap();
        self.write_seek(&mut rec, seek_dir);
        self.write_seek(&mut rec, seek_parent);
        self.write_seek(&mut rec, seek_keys);
        buf[at..at + rec.len()].copy_from_slice(&rec);
    }

    /// Emit a directory's entry records, nested directories included, then
    /// its key table. Returns `(seek_keys, nbytes_keys)`.
    fn emit_dir(
        &self,
        buf: &mut Vec<u8>,
        dir_name: &str,
        dir_title: &str,
        nbytes_name: usize,
        entries: &[Entry],
    ) -> (u64, usize) {
        let mut table: Vec<PlannedKey> = Vec::new();

        for entry in entries {
            match entry {
                Entry::Object {
                    class,
                    name,
                    title,
                    payload,
                    compress,
                } => {
                    let disk = if *compress {
                        zl_envelope(payload)
                    } else {
                        payload.clone()
                    };
                    let key_len = self.key_header_len(class, name, title);
                    let planned = PlannedKey {
                        class: class.clone(),
                        name: name.clone(),
                        title: title.clone(),
                        key_len,
                        nbytes: key_len + disk.len(),
                        obj_len: payload.len(),
                        seek_key: buf.len() as u64,
                    };
                    self.write_key(buf, &planned);
                    buf.extend_from_slice(&disk);
                    table.push(planned);
                }
                Entry::Dir {
                    name,
                    title,
                    entries,
                } => {
                    let key_len = self.key_header_len("TDirectory", name, title);
                    let rec_len = self.dir_record_len();
                    let seek_key = buf.len() as u64;
                    let planned = PlannedKey {
                        class: "TDirectory".to_owned(),
                        name: name.clone(),
                        title: title.clone(),
                        key_len,
                        nbytes: key_len + rec_len,
                        obj_len: rec_len,
                        seek_key,
                    };
                    self.write_key(buf, &planned);
                    let rec_pos = buf.len();
                    buf.resize(buf.len() + rec_len, 0);

                    let (sub_seek_keys, sub_nbytes_keys) =
                        self.emit_dir(buf, name, title, nbytes_name, entries);
                    self.write_dir_record(
                        buf,
                        rec_pos,
                        sub_nbytes_keys,
                        nbytes_name,
                        seek_key,
                        BEG,
                        sub_seek_keys,
                    );
                    table.push(planned);
                }
            }
        }

        // the key table, framed by a key sharing the directory's coordinates
        let seek_keys = buf.len() as u64;
        let header_len = self.key_header_len("TDirectory", dir_name, dir_title);
        let nbytes_keys = header_len + 4 + table.iter().map(|k| k.key_len).sum::<usize>();
        let header = PlannedKey {
            class: "TDirectory".to_owned(),
            name: dir_name.to_owned(),
            title: dir_title.to_owned(),
            key_len: header_len,
            nbytes: nbytes_keys,
            obj_len: nbytes_keys - header_len,
            seek_key: seek_keys,
        };
        self.write_key(buf, &header);
        buf.write_u32::<BigEndian>(table.len() as u32).unwrap();
        for planned in &table {
            self.write_key(buf, planned);
        }
        (seek_keys, nbytes_keys)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buf = vec![0u8; BEG as usize];

        // identity key: header only, no payload
        let id_key_len =
            self.key_header_len(&self.identity_class, &self.file_name, &self.file_title);
        let identity = PlannedKey {
            class: self.identity_class.clone(),
            name: self.file_name.clone(),
            title: self.file_title.clone(),
            key_len: id_key_len,
            nbytes: id_key_len,
            obj_len: 0,
            seek_key: BEG,
        };
        self.write_key(&mut buf, &identity);
        let nbytes_name = id_key_len;

        // root directory record, patched once its key table is placed
        let root_rec_pos = buf.len();
        buf.resize(buf.len() + self.dir_record_len(), 0);

        let (seek_keys, nbytes_keys) = self.emit_dir(
            &mut buf,
            &self.file_name,
            &self.file_title,
            nbytes_name,
            &self.entries,
        );
        self.write_dir_record(
            &mut buf,
            root_rec_pos,
            nbytes_keys,
            nbytes_name,
            BEG,
            0,
            seek_keys,
        );

        // fixed header at offset 0
        let end = buf.len() as u64;
        let mut head = Vec::new();
        head.extend_from_slice(b"root");
        head.write_u32::<BigEndian>(self.version).unwrap();
        head.write_u32::<BigEndian>(BEG as u32).unwrap();
        self.write_seek(&mut head, end);
        self.write_seek(&mut head, end); // free list starts past the data
        head.write_u32::<BigEndian>(0).unwrap();
        head.write_u32::<BigEndian>(nbytes_name as u32).unwrap();
        head.push(4); // storage units
        head.write_u32::<BigEndian>(1).unwrap(); // compression mode
        self.write_seek(&mut head, 0); // no schema record
        head.write_u32::<BigEndian>(0).unwrap();
        buf[..head.len()].copy_from_slice(&head);
        buf
    }

    /// Build and persist to a temp file, returning its guard.
    pub fn write_temp(&self) -> tempfile::NamedTempFile {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), self.build()).unwrap();
        tmp
    }
}
