//! Positional reader over an in-memory byte slice.
//!
//! All multi-byte values in the container format are big-endian. A cursor
//! never owns its backing slice, so cloning one ([`Cursor::clone_from_here`],
//! [`Cursor::at`]) is cheap and leaves the parent's position untouched —
//! that is how look-aheads and back-reference jumps are done without
//! disturbing the main decode position.
//!
//! `klen` is the header length of the enclosing key record. Back-reference
//! tags encode offsets relative to the start of that key on disk, so the
//! resolver needs it to map a tag back into this buffer (see `record.rs`).

use byteorder::{BigEndian, ByteOrder};
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};

macro_rules! read_arrays {
    ($($prefixed:ident, $fast:ident -> $ty:ty, $scalar:ident;)*) => {
        $(
            pub fn $prefixed(&mut self) -> Result<Vec<$ty>> {
                let n = self.read_u32()? as usize;
                self.$fast(n)
            }

            pub fn $fast(&mut self, n: usize) -> Result<Vec<$ty>> {
                // cap the pre-allocation: a hostile count must run into
                // Truncated, not an allocation failure
                let mut out = Vec::with_capacity(n.min(self.remaining()));
                for _ in 0..n {
                    out.push(self.$scalar()?);
                }
                Ok(out)
            }
        )*
    };
}

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    klen: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_klen(data, 0)
    }

    /// A cursor over the payload of a key whose header is `klen` bytes long.
    pub fn with_klen(data: &'a [u8], klen: u32) -> Self {
        Cursor { data, pos: 0, klen }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn klen(&self) -> u32 {
        self.klen
    }

    /// Independent cursor over the same slice, starting at the current
    /// position.
    pub fn clone_from_here(&self) -> Cursor<'a> {
        self.clone()
    }

    /// Independent cursor positioned at an absolute offset in the slice.
    pub fn at(&self, pos: usize) -> Result<Cursor<'a>> {
        if pos > self.data.len() {
            return Err(Error::Truncated {
                at: pos,
                need: pos - self.data.len(),
                left: 0,
            });
        }
        Ok(Cursor {
            data: self.data,
            pos,
            klen: self.klen,
        })
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::Truncated {
                at: self.pos,
                need: n,
                left: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    // ── scalar readers ───────────────────────────────────────────────────────

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(BigEndian::read_i16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(BigEndian::read_i64(self.take(8)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(BigEndian::read_f32(self.take(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(BigEndian::read_f64(self.take(8)?))
    }

    /// A seek offset: 8 bytes when `wide`, otherwise 4.
    pub fn read_seek(&mut self, wide: bool) -> Result<u64> {
        if wide {
            Ok(self.read_i64()? as u64)
        } else {
            Ok(self.read_i32()? as u64)
        }
    }

    /// A packed calendar timestamp (4 bytes, epoch 1995).
    pub fn read_datime(&mut self) -> Result<NaiveDateTime> {
        Ok(datime(self.read_u32()?))
    }

    // ── string readers ───────────────────────────────────────────────────────

    /// Length-prefixed string: 1-byte length, or the `0xFF` marker followed
    /// by a 4-byte length for long strings.
    pub fn read_string(&mut self) -> Result<String> {
        let mut n = self.read_u8()? as usize;
        if n == 0xFF {
            n = self.read_u32()? as usize;
        }
        Ok(String::from_utf8_lossy(self.take(n)?).into_owned())
    }

    /// NUL-terminated string, consuming at most `max` bytes. The byte that
    /// hits the cap is consumed but not kept, matching the on-disk writer's
    /// truncation behavior.
    pub fn read_cstring(&mut self, max: usize) -> Result<String> {
        let mut out = Vec::new();
        loop {
            let v = self.read_u8()?;
            if v == 0 {
                break;
            }
            if out.len() + 1 >= max {
                break;
            }
            out.push(v);
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    // ── array readers ────────────────────────────────────────────────────────
    //
    // Two variants per element type: `read_array_*` is prefixed by its own
    // 4-byte count, `read_fast_array_*` takes the count from the caller
    // (the enclosing record already knows it).

    read_arrays! {
        read_array_i16,  read_fast_array_i16  -> i16, read_i16;
        read_array_i32,  read_fast_array_i32  -> i32, read_i32;
        read_array_i64,  read_fast_array_i64  -> i64, read_i64;
        read_array_u32,  read_fast_array_u32  -> u32, read_u32;
        read_array_f32,  read_fast_array_f32  -> f32, read_f32;
        read_array_f64,  read_fast_array_f64  -> f64, read_f64;
    }
}

/// Unpacks the format's 4-byte calendar stamp. The year counts from 1995;
/// out-of-range fields collapse to the epoch, since timestamps are not
/// structural.
pub fn datime(raw: u32) -> NaiveDateTime {
    let year = ((raw >> 26) + 1995) as i32;
    let month = (raw << 6) >> 28;
    let day = (raw << 10) >> 27;
    let hour = (raw << 15) >> 27;
    let min = (raw << 20) >> 26;
    let sec = (raw << 26) >> 26;
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, min, sec))
        .unwrap_or_default()
}
