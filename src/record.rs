//! Versioned-record framing and the class/object reference resolver.
//!
//! Every streamed record opens with a 4-byte word whose top-bit marker
//! flags the versioning scheme and whose remaining bits carry the record's
//! body length, followed by a 2-byte version. After decoding a record body
//! the engine re-checks that exactly `byte_count + 4` bytes were consumed —
//! that check is the format's primary corruption detector and runs after
//! every nested object, not only at top level.
//!
//! Polymorphic objects are preceded by a class tag. Repeated class names
//! and objects are not written twice: later occurrences are back-references,
//! raw offsets into the same buffer where the first occurrence lives. The
//! resolver re-reads them through a cloned cursor; the offset arithmetic
//! (`tag - MAP_OFFSET - klen`) undoes the key-header bias the writer baked
//! into every reference.

use tracing::trace;

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::registry::{Context, Decode};

/// Top bit of the leading word marking a length-framed, versioned record.
pub const BYTE_COUNT_MASK: u32 = 0x4000_0000;
/// Tag announcing a class name written in full.
pub const NEW_CLASS_TAG: u32 = 0xFFFF_FFFF;
/// Bit marking a class tag as a back-reference.
pub const CLASS_MASK: u32 = 0x8000_0000;
/// Bias the writer adds to every back-reference offset.
pub const MAP_OFFSET: u32 = 2;

const NULL_TAG: u32 = 0;
const MAX_CLASS_NAME: usize = 80;

/// Framing header of one versioned record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub version: u16,
    /// Declared body length: everything after the leading word.
    pub byte_count: u32,
    /// Buffer position of the leading word.
    pub start: usize,
}

/// Leading 4-byte tag of a polymorphic object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassTag {
    /// No object follows.
    Null,
    /// A class written in full; `byte_count` covers the object body.
    New { name: String, byte_count: u32 },
    /// Offset-encoded reference to an object written earlier.
    ObjRef { tag: u32 },
}

impl<'a> Cursor<'a> {
    /// Decode the framing header of the record at the current position.
    pub fn read_record_header(&mut self) -> Result<RecordHeader> {
        let start = self.pos();
        let raw = self.read_u32()?;
        if raw & BYTE_COUNT_MASK == 0 {
            return Err(Error::LegacyFormat { at: start });
        }
        let version = self.read_u16()?;
        Ok(RecordHeader {
            version,
            byte_count: raw & !BYTE_COUNT_MASK,
            start,
        })
    }

    /// Check that decoding consumed exactly the declared record length.
    ///
    /// Must be called after every record body, nested ones included. Over-
    /// and under-consumption are equally fatal; the cursor is never rewound.
    pub fn verify_framing(&self, hdr: &RecordHeader, class: &str) -> Result<()> {
        self.check_consumed(hdr.start, hdr.byte_count, class)
    }

    fn check_consumed(&self, start: usize, byte_count: u32, class: &str) -> Result<()> {
        let expected = u64::from(byte_count) + 4;
        let actual = (self.pos() - start) as u64;
        if actual != expected {
            return Err(Error::FramingViolation {
                class: class.to_owned(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Map a back-reference tag to the absolute buffer position it points
    /// at. References only ever point backwards; anything else cannot
    /// terminate and is rejected.
    fn backref_target(&self, tag: u32, reference: u32, at: usize) -> Result<usize> {
        let target = reference
            .checked_sub(MAP_OFFSET)
            .and_then(|v| v.checked_sub(self.klen()))
            .map(|v| v as usize)
            .ok_or(Error::BadClassTag { tag, at })?;
        if target >= at {
            return Err(Error::BadClassTag { tag, at });
        }
        Ok(target)
    }

    /// Decode the class tag preceding a polymorphic object.
    pub fn read_class(&mut self) -> Result<ClassTag> {
        let tag = self.read_u32()?;
        if tag == NULL_TAG {
            return Ok(ClassTag::Null);
        }
        if tag & BYTE_COUNT_MASK != 0 {
            let name = self.read_class_tag()?;
            return Ok(ClassTag::New {
                name,
                byte_count: tag & !BYTE_COUNT_MASK,
            });
        }
        Ok(ClassTag::ObjRef { tag })
    }

    /// Resolve a class-name tag: either a bounded string written in full,
    /// or a back-reference chasing the first occurrence of the same name.
    /// Chains of back-references resolve transitively.
    pub fn read_class_tag(&mut self) -> Result<String> {
        let at = self.pos();
        let tag = self.read_u32()?;
        if tag == NEW_CLASS_TAG {
            let name = self.read_cstring(MAX_CLASS_NAME)?;
            if name.is_empty() {
                return Err(Error::BadClassTag { tag, at });
            }
            return Ok(name);
        }
        if tag & CLASS_MASK != 0 {
            let reference = tag & !CLASS_MASK;
            let target = self.backref_target(tag, reference, at)?;
            trace!(reference, target, "class tag chases a back-reference");
            let mut back = self.at(target)?;
            return back.read_class_tag();
        }
        Err(Error::BadClassTag { tag, at })
    }

    /// Decode one polymorphic object: resolve its class tag, build an
    /// instance through the registry (or the skip fallback), run its decode,
    /// and verify the advertised byte count.
    ///
    /// Yields `None` for a null tag and for object back-references — the
    /// latter are resolved for validity but not re-materialized, matching
    /// the reference decoder. Both consume exactly the 4 tag bytes.
    pub fn read_object(&mut self, ctx: &Context<'_>) -> Result<Option<Box<dyn Decode>>> {
        let start = self.pos();
        match self.read_class()? {
            ClassTag::Null => Ok(None),
            ClassTag::ObjRef { tag } => {
                let target = self.backref_target(tag, tag, start)?;
                trace!(tag, target, "object tag chases a back-reference");
                let mut back = self.at(target)?;
                let first = back.clone_from_here().read_u32()?;
                if first & BYTE_COUNT_MASK != 0 {
                    back.skip(4)?;
                    back.read_class_tag()?;
                }
                Ok(None)
            }
            ClassTag::New { name, byte_count } => {
                trace!(class = %name, byte_count, "decoding object");
                let mut obj = ctx.registry.make(&name);
                obj.decode(self, ctx)?;
                self.check_consumed(start, byte_count, &name)?;
                Ok(Some(obj))
            }
        }
    }
}
