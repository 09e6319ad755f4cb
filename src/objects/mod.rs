//! Concrete record types: clients of the framing and resolver contracts.
//!
//! Each type decodes one era-versioned record layout; version branching is
//! an explicit match over version ranges, each arm reading exactly the
//! fields present in that era. Anything the registry does not model ends
//! up as a `RawSkip` instead.

pub mod list;
pub mod named;
pub mod sinfo;

pub use list::{List, ObjArray};
pub use named::Named;
pub use sinfo::{
    Element, StreamerBase, StreamerBasicPointer, StreamerBasicType, StreamerInfo, StreamerStl,
    StreamerStlString, StreamerString,
};

use crate::cursor::Cursor;
use crate::error::Result;

pub(crate) const IS_ON_HEAP: u32 = 0x0100_0000;
pub(crate) const IS_REFERENCED: u32 = 1 << 4;

/// The embedded base-object fields: unique id and bit flags. Records whose
/// referenced bit is clear carry 2 extra bytes here.
pub(crate) fn read_object_header(cur: &mut Cursor<'_>) -> Result<(u32, u32)> {
    let id = cur.read_u32()?;
    let mut bits = cur.read_u32()?;
    bits |= IS_ON_HEAP; // a deserialized object lives on the heap
    if bits & IS_REFERENCED == 0 {
        cur.skip(2)?;
    }
    Ok((id, bits))
}
