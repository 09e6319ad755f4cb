//! The compression envelope wrapped around every compressed key payload.
//!
//! A block opens with a fixed 9-byte header: the two algorithm-identifier
//! bytes `"ZL"`, the deflate method byte, then the compressed and
//! uncompressed sizes as 3-byte little-endian integers. The remainder is a
//! zlib stream. Deflate is the only method this format ever wrote, so
//! anything else in the header is a hard error, never a fallback.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::{Error, Result};

/// Envelope header length in bytes.
pub const HEADER_LEN: usize = 9;

const ALGO_TAG: [u8; 2] = *b"ZL";
const METHOD_DEFLATE: u8 = 8;

fn read_u24(b: &[u8]) -> u32 {
    u32::from(b[0]) | u32::from(b[1]) << 8 | u32::from(b[2]) << 16
}

/// Inflate one compressed block, header included.
pub fn decompress(src: &[u8]) -> Result<Vec<u8>> {
    if src.len() < HEADER_LEN {
        return Err(Error::BadCompressionHeader(format!(
            "block of {} byte(s) is shorter than the {HEADER_LEN}-byte header",
            src.len()
        )));
    }
    if src[0..2] != ALGO_TAG || src[2] != METHOD_DEFLATE {
        return Err(Error::BadCompressionHeader(format!(
            "unrecognized algorithm/method bytes {:02x} {:02x} {:02x}",
            src[0], src[1], src[2]
        )));
    }

    let compressed = read_u24(&src[3..6]) as usize;
    let uncompressed = read_u24(&src[6..9]) as usize;
    if compressed != src.len() - HEADER_LEN {
        return Err(Error::BadCompressionHeader(format!(
            "declared compressed size {compressed} != {} payload byte(s)",
            src.len() - HEADER_LEN
        )));
    }

    let mut out = Vec::with_capacity(uncompressed);
    ZlibDecoder::new(&src[HEADER_LEN..])
        .read_to_end(&mut out)
        .map_err(|e| Error::InflateFailure(e.to_string()))?;

    if out.len() != uncompressed {
        return Err(Error::BadCompressionHeader(format!(
            "declared uncompressed size {uncompressed} != {} inflated byte(s)",
            out.len()
        )));
    }
    Ok(out)
}
