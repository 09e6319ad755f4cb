//! Schema descriptors: the records a file carries to describe the layout
//! of every class it persisted.
//!
//! A descriptor is a named record plus a checksum, a class version, and an
//! object array of elements — one element per persisted member, each a
//! framed record of its own. Element subclasses the registry does not
//! model are skipped like any other unknown object.

use std::any::Any;

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::objects::list::ObjArray;
use crate::objects::named::read_named;
use crate::registry::{Context, Decode};

// ── StreamerInfo ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct StreamerInfo {
    name: String,
    title: String,
    checksum: u32,
    class_version: u32,
    elements: ObjArray,
}

impl StreamerInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn class_version(&self) -> u32 {
        self.class_version
    }

    pub fn elements(&self) -> &ObjArray {
        &self.elements
    }
}

impl Decode for StreamerInfo {
    fn class_name(&self) -> &str {
        "TStreamerInfo"
    }

    fn decode(&mut self, cur: &mut Cursor<'_>, ctx: &Context<'_>) -> Result<()> {
        let hdr = cur.read_record_header()?;
        let (name, title) = read_named(cur)?;
        self.name = name;
        self.title = title;
        if hdr.version <= 1 {
            return Err(Error::UnsupportedFormatVersion(hdr.version.into()));
        }
        self.checksum = cur.read_u32()?;
        self.class_version = cur.read_u32()?;
        // class tag of the embedded element array; the array follows inline
        let _ = cur.read_class()?;
        let mut elements = ObjArray::default();
        elements.decode(cur, ctx)?;
        self.elements = elements;
        cur.verify_framing(&hdr, "TStreamerInfo")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ── Element base ─────────────────────────────────────────────────────────────

/// The element fields every subclass embeds: identity, member type and
/// size, array shape, and the member's declared type name.
#[derive(Debug, Clone, Default)]
pub struct Element {
    name: String,
    title: String,
    etype: i32,
    esize: i32,
    arr_len: i32,
    arr_dim: i32,
    max_idx: Vec<i32>,
    type_name: String,
}

impl Element {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn etype(&self) -> i32 {
        self.etype
    }

    pub fn esize(&self) -> i32 {
        self.esize
    }

    pub fn arr_len(&self) -> i32 {
        self.arr_len
    }

    pub fn arr_dim(&self) -> i32 {
        self.arr_dim
    }

    pub fn max_idx(&self) -> &[i32] {
        &self.max_idx
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

impl Decode for Element {
    fn class_name(&self) -> &str {
        "TStreamerElement"
    }

    fn decode(&mut self, cur: &mut Cursor<'_>, _ctx: &Context<'_>) -> Result<()> {
        let hdr = cur.read_record_header()?;
        if hdr.version < 2 {
            return Err(Error::UnsupportedFormatVersion(hdr.version.into()));
        }
        let (name, title) = read_named(cur)?;
        self.name = name;
        self.title = title;
        self.etype = cur.read_i32()?;
        self.esize = cur.read_i32()?;
        self.arr_len = cur.read_i32()?;
        self.arr_dim = cur.read_i32()?;
        self.max_idx = cur.read_fast_array_i32(5)?;
        self.type_name = cur.read_string()?;
        cur.verify_framing(&hdr, "TStreamerElement")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ── Subclasses ───────────────────────────────────────────────────────────────

/// Element for an inherited base class; carries the base's own version.
#[derive(Debug, Clone, Default)]
pub struct StreamerBase {
    elem: Element,
    base_version: i32,
}

impl StreamerBase {
    pub fn element(&self) -> &Element {
        &self.elem
    }

    pub fn base_version(&self) -> i32 {
        self.base_version
    }
}

impl Decode for StreamerBase {
    fn class_name(&self) -> &str {
        "TStreamerBase"
    }

    fn decode(&mut self, cur: &mut Cursor<'_>, ctx: &Context<'_>) -> Result<()> {
        let hdr = cur.read_record_header()?;
        if hdr.version < 2 {
            return Err(Error::UnsupportedFormatVersion(hdr.version.into()));
        }
        self.elem.decode(cur, ctx)?;
        self.base_version = cur.read_i32()?;
        cur.verify_framing(&hdr, "TStreamerBase")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Element for a builtin-typed member.
#[derive(Debug, Clone, Default)]
pub struct StreamerBasicType {
    elem: Element,
}

impl StreamerBasicType {
    pub fn element(&self) -> &Element {
        &self.elem
    }
}

impl Decode for StreamerBasicType {
    fn class_name(&self) -> &str {
        "TStreamerBasicType"
    }

    fn decode(&mut self, cur: &mut Cursor<'_>, ctx: &Context<'_>) -> Result<()> {
        let hdr = cur.read_record_header()?;
        if hdr.version < 2 {
            return Err(Error::UnsupportedFormatVersion(hdr.version.into()));
        }
        self.elem.decode(cur, ctx)?;
        cur.verify_framing(&hdr, "TStreamerBasicType")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Element for a pointer to builtins counted by another member.
#[derive(Debug, Clone, Default)]
pub struct StreamerBasicPointer {
    elem: Element,
    count_version: i32,
    count_name: String,
    count_class: String,
}

impl StreamerBasicPointer {
    pub fn element(&self) -> &Element {
        &self.elem
    }

    pub fn count_version(&self) -> i32 {
        self.count_version
    }

    pub fn count_name(&self) -> &str {
        &self.count_name
    }

    pub fn count_class(&self) -> &str {
        &self.count_class
    }
}

impl Decode for StreamerBasicPointer {
    fn class_name(&self) -> &str {
        "TStreamerBasicPointer"
    }

    fn decode(&mut self, cur: &mut Cursor<'_>, ctx: &Context<'_>) -> Result<()> {
        let hdr = cur.read_record_header()?;
        if hdr.version < 2 {
            return Err(Error::UnsupportedFormatVersion(hdr.version.into()));
        }
        self.elem.decode(cur, ctx)?;
        self.count_version = cur.read_i32()?;
        self.count_name = cur.read_string()?;
        self.count_class = cur.read_string()?;
        cur.verify_framing(&hdr, "TStreamerBasicPointer")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Element for a string member.
#[derive(Debug, Clone, Default)]
pub struct StreamerString {
    elem: Element,
}

impl StreamerString {
    pub fn element(&self) -> &Element {
        &self.elem
    }
}

impl Decode for StreamerString {
    fn class_name(&self) -> &str {
        "TStreamerString"
    }

    fn decode(&mut self, cur: &mut Cursor<'_>, ctx: &Context<'_>) -> Result<()> {
        let hdr = cur.read_record_header()?;
        if hdr.version < 2 {
            return Err(Error::UnsupportedFormatVersion(hdr.version.into()));
        }
        self.elem.decode(cur, ctx)?;
        cur.verify_framing(&hdr, "TStreamerString")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Element for an STL container member.
#[derive(Debug, Clone, Default)]
pub struct StreamerStl {
    elem: Element,
    stl_type: i32,
    content_type: i32,
}

impl StreamerStl {
    pub fn element(&self) -> &Element {
        &self.elem
    }

    pub fn stl_type(&self) -> i32 {
        self.stl_type
    }

    pub fn content_type(&self) -> i32 {
        self.content_type
    }
}

impl Decode for StreamerStl {
    fn class_name(&self) -> &str {
        "TStreamerSTL"
    }

    fn decode(&mut self, cur: &mut Cursor<'_>, ctx: &Context<'_>) -> Result<()> {
        let hdr = cur.read_record_header()?;
        if hdr.version < 2 {
            return Err(Error::UnsupportedFormatVersion(hdr.version.into()));
        }
        self.elem.decode(cur, ctx)?;
        self.stl_type = cur.read_i32()?;
        self.content_type = cur.read_i32()?;
        cur.verify_framing(&hdr, "TStreamerSTL")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Element for a `std::string` member, layered over the STL element.
#[derive(Debug, Clone, Default)]
pub struct StreamerStlString {
    stl: StreamerStl,
}

impl StreamerStlString {
    pub fn element(&self) -> &Element {
        self.stl.element()
    }
}

impl Decode for StreamerStlString {
    fn class_name(&self) -> &str {
        "TStreamerSTLstring"
    }

    fn decode(&mut self, cur: &mut Cursor<'_>, ctx: &Context<'_>) -> Result<()> {
        let hdr = cur.read_record_header()?;
        if hdr.version < 2 {
            return Err(Error::UnsupportedFormatVersion(hdr.version.into()));
        }
        self.stl.decode(cur, ctx)?;
        cur.verify_framing(&hdr, "TStreamerSTLstring")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
