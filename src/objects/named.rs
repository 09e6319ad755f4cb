//! The named record: the simplest framed object, a name/title pair.

use std::any::Any;

use crate::cursor::Cursor;
use crate::error::Result;
use crate::objects::read_object_header;
use crate::registry::{Context, Decode};

#[derive(Debug, Clone, Default)]
pub struct Named {
    name: String,
    title: String,
}

impl Named {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl Decode for Named {
    fn class_name(&self) -> &str {
        "TNamed"
    }

    fn decode(&mut self, cur: &mut Cursor<'_>, _ctx: &Context<'_>) -> Result<()> {
        let (name, title) = read_named(cur)?;
        self.name = name;
        self.title = title;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Decode one complete framed named record and hand back its name/title.
/// Several record types embed a named record verbatim.
pub(crate) fn read_named(cur: &mut Cursor<'_>) -> Result<(String, String)> {
    let hdr = cur.read_record_header()?;
    read_object_header(cur)?;
    let name = cur.read_string()?;
    let title = cur.read_string()?;
    cur.verify_framing(&hdr, "TNamed")?;
    Ok((name, title))
}
