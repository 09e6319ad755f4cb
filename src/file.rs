//! Top-level container bootstrap.
//!
//! Opening a file runs the fixed sequence: magic check, fixed header
//! (offset widths gated by the format version), identity record at `begin`
//! (its class must be `TFile`), root directory record at
//! `begin + nbytes_name`, then the root key table. Every later payload
//! fetch goes through [`File::read_at`], which holds the handle mutex so
//! that seek and read are atomic as a pair; all decoding after the fetch
//! runs on owned, immutable buffers.

use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::cursor::Cursor;
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::key::Key;
use crate::registry::{Context, Decode};

pub(crate) const MAGIC: &[u8; 4] = b"root";

/// Oldest format version the decoder understands.
const MIN_FORMAT_VERSION: u32 = 30006;
/// Versions from here on store 8-byte seek offsets ("large files").
const LARGE_FILE_VERSION: u32 = 1_000_000;

/// Fixed header never exceeds this many bytes, wide variant included.
const HEADER_MAX: usize = 64;
/// Directory record never exceeds this many bytes, wide variant included.
const DIR_RECORD_MAX: usize = 42;

/// The fixed header at offset 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    pub begin: u64,
    pub end: u64,
    pub seek_free: u64,
    pub nbytes_free: u32,
    pub nbytes_name: u32,
    pub units: u8,
    pub compression: u32,
    pub seek_info: u64,
    pub nbytes_info: u32,
}

impl Header {
    /// Parse the magic and fixed header from the leading bytes of a file.
    pub fn parse(data: &[u8]) -> Result<Header> {
        if data.len() < MAGIC.len() || &data[..MAGIC.len()] != MAGIC {
            return Err(Error::BadMagic);
        }
        let mut cur = Cursor::new(data);
        cur.skip(MAGIC.len())?;

        let version = cur.read_u32()?;
        if version < MIN_FORMAT_VERSION {
            return Err(Error::UnsupportedFormatVersion(version));
        }
        let wide = version >= LARGE_FILE_VERSION;

        Ok(Header {
            version,
            begin: u64::from(cur.read_u32()?),
            end: cur.read_seek(wide)?,
            seek_free: cur.read_seek(wide)?,
            nbytes_free: cur.read_u32()?,
            nbytes_name: cur.read_u32()?,
            units: cur.read_u8()?,
            compression: cur.read_u32()?,
            seek_info: cur.read_seek(wide)?,
            nbytes_info: cur.read_u32()?,
        })
    }

    /// True when the header stores 8-byte seek offsets.
    pub fn is_large(&self) -> bool {
        self.version >= LARGE_FILE_VERSION
    }
}

pub struct File {
    handle: Mutex<fs::File>,
    path: PathBuf,
    len: u64,
    header: Header,
    name: String,
    title: String,
    root: Directory,
}

impl File {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<File> {
        let path = path.as_ref().to_owned();
        let handle = fs::File::open(&path)?;
        let len = handle.metadata()?.len();

        let mut f = File {
            handle: Mutex::new(handle),
            path,
            len,
            header: Header::default(),
            name: String::new(),
            title: String::new(),
            root: Directory::default(),
        };

        let head = f.read_at(0, HEADER_MAX.min(f.len as usize))?;
        f.header = Header::parse(&head)?;
        debug!(
            version = f.header.version,
            begin = f.header.begin,
            end = f.header.end,
            large = f.header.is_large(),
            "parsed container header"
        );
        f.read_identity()?;

        let mut root = Directory::default();
        let pos = f.header.begin + u64::from(f.header.nbytes_name);
        let want = DIR_RECORD_MAX.min(f.len.saturating_sub(pos) as usize);
        let buf = f.read_at(pos, want)?;
        root.from_cursor(&mut Cursor::new(&buf))?;
        root.read_keys(&f)?;
        f.root = root;
        Ok(f)
    }

    /// The identity record at `begin` is a plain key header whose class
    /// names the container format itself.
    fn read_identity(&mut self) -> Result<()> {
        let want = (self.header.nbytes_name as usize)
            .min(self.len.saturating_sub(self.header.begin) as usize);
        let buf = self.read_at(self.header.begin, want)?;
        let mut cur = Cursor::new(&buf);
        let mut key = Key::at(self.header.begin, 0);
        key.read_from(&mut cur)?;
        if key.class_name() != "TFile" {
            return Err(Error::UnexpectedRootClass(key.class_name().to_owned()));
        }
        self.name = key.name().to_owned();
        self.title = key.title().to_owned();
        Ok(())
    }

    /// Read exactly `len` bytes at the absolute offset `pos`. The handle
    /// lock makes the seek/read pair atomic.
    pub(crate) fn read_at(&self, pos: u64, len: usize) -> Result<Vec<u8>> {
        let mut guard = match self.handle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.seek(SeekFrom::Start(pos))?;
        let mut buf = vec![0u8; len];
        guard.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// The schema-descriptor record, when the file carries one.
    pub fn streamer_info(&self, ctx: &Context<'_>) -> Result<Option<Box<dyn Decode>>> {
        if self.header.seek_info == 0 || self.header.nbytes_info == 0 {
            return Ok(None);
        }
        let buf = self.read_at(self.header.seek_info, self.header.nbytes_info as usize)?;
        let mut cur = Cursor::new(&buf);
        let mut key = Key::at(self.header.seek_info, self.header.nbytes_info);
        key.read_from(&mut cur)?;
        key.value(ctx).map(Some)
    }

    // ── accessors ────────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn version(&self) -> u32 {
        self.header.version
    }

    pub fn is_large(&self) -> bool {
        self.header.is_large()
    }

    pub fn begin(&self) -> u64 {
        self.header.begin
    }

    pub fn end(&self) -> u64 {
        self.header.end
    }

    pub fn units(&self) -> u8 {
        self.header.units
    }

    pub fn compression(&self) -> u32 {
        self.header.compression
    }

    pub fn seek_info(&self) -> u64 {
        self.header.seek_info
    }

    pub fn nbytes_info(&self) -> u32 {
        self.header.nbytes_info
    }

    pub fn root(&self) -> &Directory {
        &self.root
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("version", &self.header.version)
            .field("begin", &self.header.begin)
            .field("end", &self.header.end)
            .field("keys", &self.root.keys().len())
            .finish()
    }
}
