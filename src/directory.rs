//! Directories: ordered key collections, themselves persisted as records.
//!
//! A directory record carries its timestamps, the sizes of its own named
//! header and key table, and the seek offsets of itself, its parent and its
//! key table. The key table is physically the payload of a synthetic key
//! sharing the directory's coordinates: a key header, a 4-byte count, then
//! that many key headers in on-disk order.

use std::any::Any;

use chrono::NaiveDateTime;
use tracing::trace;

use crate::cursor::Cursor;
use crate::error::Result;
use crate::file::File;
use crate::key::Key;
use crate::registry::{Context, Decode};

#[derive(Debug, Clone, Default)]
pub struct Directory {
    ctime: NaiveDateTime,
    mtime: NaiveDateTime,
    nbytes_keys: u32,
    nbytes_name: u32,
    seek_dir: u64,
    seek_parent: u64,
    seek_keys: u64,
    keys: Vec<Key>,
}

impl Directory {
    /// Keys in on-disk order. The order is insertion order, never sorted.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// First key with the given object name, in on-disk order.
    pub fn key(&self, name: &str) -> Option<&Key> {
        self.keys.iter().find(|k| k.name() == name)
    }

    pub fn ctime(&self) -> NaiveDateTime {
        self.ctime
    }

    pub fn mtime(&self) -> NaiveDateTime {
        self.mtime
    }

    pub fn nbytes_keys(&self) -> u32 {
        self.nbytes_keys
    }

    pub fn seek_keys(&self) -> u64 {
        self.seek_keys
    }

    pub fn seek_dir(&self) -> u64 {
        self.seek_dir
    }

    pub fn seek_parent(&self) -> u64 {
        self.seek_parent
    }

    /// Decode the fixed directory record. Timestamps are 4-byte datimes at
    /// every version; the three seek fields widen past version 1000.
    pub(crate) fn from_cursor(&mut self, cur: &mut Cursor<'_>) -> Result<()> {
        let version = cur.read_u16()?;
        self.ctime = cur.read_datime()?;
        self.mtime = cur.read_datime()?;
        self.nbytes_keys = cur.read_u32()?;
        self.nbytes_name = cur.read_u32()?;
        let wide = version > 1000;
        self.seek_dir = cur.read_seek(wide)?;
        self.seek_parent = cur.read_seek(wide)?;
        self.seek_keys = cur.read_seek(wide)?;
        trace!(
            version,
            seek_dir = self.seek_dir,
            seek_keys = self.seek_keys,
            nbytes_keys = self.nbytes_keys,
            "decoded directory record"
        );
        Ok(())
    }

    /// Load the key table from `seek_keys`/`nbytes_keys`.
    pub(crate) fn read_keys(&mut self, file: &File) -> Result<usize> {
        let raw = file.read_at(self.seek_keys, self.nbytes_keys as usize)?;
        let mut cur = Cursor::new(&raw);

        // the table is framed by a key sharing the directory's coordinates
        let mut header = Key::at(self.seek_keys, self.nbytes_keys);
        header.read_from(&mut cur)?;

        let nkeys = cur.read_u32()?;
        trace!(nkeys, "loading key table");
        self.keys = Vec::with_capacity((nkeys as usize).min(cur.remaining()));
        for _ in 0..nkeys {
            let mut key = Key::at(0, 0);
            key.read_from(&mut cur)?;
            self.keys.push(key);
        }
        Ok(self.keys.len())
    }
}

impl Decode for Directory {
    fn class_name(&self) -> &str {
        "TDirectory"
    }

    /// A directory read through a key decodes its record from the payload
    /// buffer, then seeks back into the file for its own key table — this
    /// is how sub-directories are browsed.
    fn decode(&mut self, cur: &mut Cursor<'_>, ctx: &Context<'_>) -> Result<()> {
        self.from_cursor(cur)?;
        self.read_keys(ctx.file()?)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
