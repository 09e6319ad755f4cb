//! Class registry: maps a class-name string to a constructor producing a
//! fresh decodable instance.
//!
//! The registry is an explicit value, not process-wide state: tests build
//! isolated registries, and [`Registry::default`] carries every built-in
//! record type. Lookups never fail destructively — a name with no maker is
//! decoded as a [`RawSkip`], which consumes exactly the record length its
//! framing header advertises. That fallback is what lets a file full of
//! unsupported record types still be browsed as a tree.

use std::any::Any;
use std::collections::HashMap;
use std::io;

use tracing::debug;

use crate::cursor::Cursor;
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::file::File;
use crate::objects::{
    Element, List, Named, ObjArray, StreamerBase, StreamerBasicPointer, StreamerBasicType,
    StreamerInfo, StreamerStl, StreamerStlString, StreamerString,
};

/// A record type that knows how to populate itself from a cursor.
///
/// Implementations decode one versioned record: read the framing header,
/// the version-appropriate fields, and verify the byte count before
/// returning.
pub trait Decode: Any {
    /// The on-disk class name this instance decodes as.
    fn class_name(&self) -> &str;

    /// Populate `self` from the record at the cursor's position.
    fn decode(&mut self, cur: &mut Cursor<'_>, ctx: &Context<'_>) -> Result<()>;

    /// Downcasting hook for callers that know the concrete type.
    fn as_any(&self) -> &dyn Any;
}

/// Zero-argument constructor for a registered record type.
pub type Maker = fn() -> Box<dyn Decode>;

/// Borrowed decode environment: the registry for nested polymorphic
/// objects, and the backing file for record types that need to seek
/// further into it (directories). The file is a weak association — decoded
/// objects never own it.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub registry: &'a Registry,
    pub file: Option<&'a File>,
}

impl<'a> Context<'a> {
    pub fn new(registry: &'a Registry, file: &'a File) -> Self {
        Context {
            registry,
            file: Some(file),
        }
    }

    /// A context with no backing file, for decoding free-standing buffers.
    pub fn detached(registry: &'a Registry) -> Self {
        Context {
            registry,
            file: None,
        }
    }

    pub(crate) fn file(&self) -> Result<&'a File> {
        self.file.ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::Unsupported,
                "record type needs a backing file to decode",
            ))
        })
    }
}

pub struct Registry {
    makers: HashMap<String, Maker>,
}

impl Registry {
    /// A registry with no types at all. Everything decodes as [`RawSkip`].
    pub fn empty() -> Self {
        Registry {
            makers: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: &str, maker: Maker) {
        self.makers.insert(name.to_owned(), maker);
    }

    pub fn lookup(&self, name: &str) -> Option<Maker> {
        self.makers.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.makers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.makers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.makers.is_empty()
    }

    /// A fresh instance for `name`, falling back to [`RawSkip`] when the
    /// class is not registered.
    pub fn make(&self, name: &str) -> Box<dyn Decode> {
        match self.lookup(name) {
            Some(maker) => maker(),
            None => {
                debug!(class = name, "no maker registered, decoding as an opaque skip");
                Box::new(RawSkip::new(name))
            }
        }
    }
}

impl Default for Registry {
    /// A registry carrying every built-in record type.
    fn default() -> Self {
        let mut r = Registry::empty();
        r.register("TDirectory", || Box::new(Directory::default()));
        r.register("TNamed", || Box::new(Named::default()));
        r.register("TList", || Box::new(List::default()));
        r.register("TObjArray", || Box::new(ObjArray::default()));
        r.register("TStreamerInfo", || Box::new(StreamerInfo::default()));
        r.register("TStreamerElement", || Box::new(Element::default()));
        r.register("TStreamerBase", || Box::new(StreamerBase::default()));
        r.register("TStreamerBasicType", || Box::new(StreamerBasicType::default()));
        r.register("TStreamerBasicPointer", || {
            Box::new(StreamerBasicPointer::default())
        });
        r.register("TStreamerString", || Box::new(StreamerString::default()));
        r.register("TStreamerSTL", || Box::new(StreamerStl::default()));
        r.register("TStreamerSTLstring", || Box::new(StreamerStlString::default()));
        r
    }
}

// ── RawSkip ──────────────────────────────────────────────────────────────────

/// Placeholder instance for classes with no registered maker.
///
/// Its only behavior is to consume exactly the bytes its own framing header
/// advertises and discard them, preserving the byte accounting of whatever
/// record surrounds it.
#[derive(Debug, Default)]
pub struct RawSkip {
    class: String,
    skipped: usize,
}

impl RawSkip {
    pub fn new(class: impl Into<String>) -> Self {
        RawSkip {
            class: class.into(),
            skipped: 0,
        }
    }

    /// Bytes consumed by the last decode, framing header included.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Decode for RawSkip {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn decode(&mut self, cur: &mut Cursor<'_>, _ctx: &Context<'_>) -> Result<()> {
        let hdr = cur.clone_from_here().read_record_header()?;
        let total = hdr.byte_count as usize + 4;
        cur.skip(total)?;
        self.skipped = total;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
