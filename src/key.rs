//! Keys: the directory entries of the container.
//!
//! A key records everything needed to locate and identify one persisted
//! object: class name, object name/title, cycle number, the absolute seek
//! offset of its record, the key-header length, the total on-disk length
//! and the uncompressed object length. The payload itself is fetched
//! lazily by [`Key::payload`] / [`Key::value`].

use chrono::NaiveDateTime;
use tracing::trace;

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::file::File;
use crate::registry::{Context, Decode};
use crate::unzip;

/// Records seeking past this point are written with the wide key layout.
pub(crate) const START_BIG_FILE: u64 = 2_000_000_000;

#[derive(Debug, Clone, Default)]
pub struct Key {
    nbytes: u32,
    version: u32,
    obj_len: u32,
    datime: NaiveDateTime,
    key_len: u16,
    cycle: u16,
    seek_key: u64,
    seek_pdir: u64,
    class: String,
    name: String,
    title: String,
}

impl Key {
    /// A synthetic key framing the record at `seek_key`, used to bootstrap
    /// key tables and header-region records before their real headers are
    /// decoded.
    pub(crate) fn at(seek_key: u64, nbytes: u32) -> Self {
        let mut version = 2;
        if seek_key > START_BIG_FILE {
            version += 1000;
        }
        Key {
            nbytes,
            version,
            seek_key,
            ..Key::default()
        }
    }

    /// Decode the key header at the cursor's position. Seek-offset widths
    /// are gated by the key-format version.
    pub(crate) fn read_from(&mut self, cur: &mut Cursor<'_>) -> Result<()> {
        self.nbytes = cur.read_u32()?;
        self.version = u32::from(cur.read_u16()?);
        self.obj_len = cur.read_i32()? as u32;
        self.datime = cur.read_datime()?;
        self.key_len = cur.read_u16()?;
        self.cycle = cur.read_u16()?;
        let wide = self.version > 1000;
        self.seek_key = cur.read_seek(wide)?;
        self.seek_pdir = cur.read_seek(wide)?;
        self.class = cur.read_string()?;
        self.name = cur.read_string()?;
        self.title = cur.read_string()?;
        trace!(
            class = %self.class,
            name = %self.name,
            nbytes = self.nbytes,
            objlen = self.obj_len,
            "decoded key header"
        );
        Ok(())
    }

    // ── identity ─────────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn class_name(&self) -> &str {
        &self.class
    }

    pub fn cycle(&self) -> u16 {
        self.cycle
    }

    pub fn datime(&self) -> NaiveDateTime {
        self.datime
    }

    // ── placement ────────────────────────────────────────────────────────────

    /// Total on-disk length of the record, key header included.
    pub fn total_len(&self) -> u32 {
        self.nbytes
    }

    /// Uncompressed object length.
    pub fn obj_len(&self) -> u32 {
        self.obj_len
    }

    pub fn key_len(&self) -> u16 {
        self.key_len
    }

    pub fn seek_key(&self) -> u64 {
        self.seek_key
    }

    /// Seek offset of the directory that owns this key.
    pub fn seek_pdir(&self) -> u64 {
        self.seek_pdir
    }

    /// Stored length of the payload on disk.
    fn stored_len(&self) -> u32 {
        self.nbytes.saturating_sub(u32::from(self.key_len))
    }

    /// A payload shorter on disk than its object length has been run
    /// through the compression envelope.
    pub fn is_compressed(&self) -> bool {
        self.obj_len > self.stored_len()
    }

    // ── payload ──────────────────────────────────────────────────────────────

    /// Fetch the object buffer, inflating it when the size invariant says
    /// the stored bytes are compressed.
    pub fn payload(&self, file: &File) -> Result<Vec<u8>> {
        let raw = file.read_at(self.seek_key, self.nbytes as usize)?;
        if raw.len() < usize::from(self.key_len) {
            return Err(Error::Truncated {
                at: self.seek_key as usize,
                need: usize::from(self.key_len),
                left: raw.len(),
            });
        }
        let stored = &raw[usize::from(self.key_len)..];
        trace!(
            name = %self.name,
            compressed = self.is_compressed(),
            stored = stored.len(),
            "fetched key payload"
        );
        if self.is_compressed() {
            unzip::decompress(stored)
        } else {
            Ok(stored.to_vec())
        }
    }

    /// Decode the key's object: look the class up in the registry (falling
    /// back to the opaque skip for unknown classes), fetch the payload and
    /// run the instance's versioned decode against it. The decoded object
    /// borrows the file through `ctx` for any further seeks; it never owns
    /// it.
    pub fn value(&self, ctx: &Context<'_>) -> Result<Box<dyn Decode>> {
        let file = ctx.file()?;
        let mut obj = ctx.registry.make(&self.class);
        let buf = self.payload(file)?;
        let mut cur = Cursor::with_klen(&buf, u32::from(self.key_len));
        obj.decode(&mut cur, ctx)?;
        Ok(obj)
    }
}
