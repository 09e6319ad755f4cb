//! Polymorphic collections: the linked list and the bounded object array.
//!
//! Both hold their elements through `read_object`, so a collection in a
//! file may freely mix record types the registry models with ones it
//! skips.

use std::any::Any;

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::objects::read_object_header;
use crate::registry::{Context, Decode};

// ── List ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct List {
    name: String,
    objs: Vec<Box<dyn Decode>>,
}

impl List {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.objs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&dyn Decode> {
        self.objs.get(i).map(|o| o.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Decode> {
        self.objs.iter().map(|o| o.as_ref())
    }
}

impl Decode for List {
    fn class_name(&self) -> &str {
        "TList"
    }

    fn decode(&mut self, cur: &mut Cursor<'_>, ctx: &Context<'_>) -> Result<()> {
        let hdr = cur.read_record_header()?;
        if hdr.version <= 3 {
            return Err(Error::UnsupportedFormatVersion(hdr.version.into()));
        }
        read_object_header(cur)?;
        self.name = cur.read_string()?;
        let nobjs = cur.read_i32()?;
        for _ in 0..nobjs {
            let obj = cur.read_object(ctx)?;
            // each element is trailed by its option string
            let _opt = cur.read_string()?;
            // null slots and back-references carry no instance
            if let Some(obj) = obj {
                self.objs.push(obj);
            }
        }
        cur.verify_framing(&hdr, "TList")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ── ObjArray ─────────────────────────────────────────────────────────────────

/// A bounded array of objects. Unlike [`List`] it keeps its null slots, so
/// element indices line up with the writer's.
#[derive(Default)]
pub struct ObjArray {
    name: String,
    lower_bound: i32,
    objs: Vec<Option<Box<dyn Decode>>>,
}

impl ObjArray {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lower_bound(&self) -> i32 {
        self.lower_bound
    }

    pub fn len(&self) -> usize {
        self.objs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&dyn Decode> {
        self.objs.get(i).and_then(|o| o.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&dyn Decode>> {
        self.objs.iter().map(|o| o.as_deref())
    }
}

impl Decode for ObjArray {
    fn class_name(&self) -> &str {
        "TObjArray"
    }

    fn decode(&mut self, cur: &mut Cursor<'_>, ctx: &Context<'_>) -> Result<()> {
        let hdr = cur.read_record_header()?;
        if hdr.version > 2 {
            // object version, then unique id and bits
            cur.skip(2)?;
            cur.skip(8)?;
        }
        self.name = cur.read_string()?;
        let nobjs = cur.read_i32()?;
        self.lower_bound = cur.read_i32()?;
        for _ in 0..nobjs {
            self.objs.push(cur.read_object(ctx)?);
        }
        cur.verify_framing(&hdr, "TObjArray")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
