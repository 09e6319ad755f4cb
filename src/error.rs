//! Error taxonomy for the decoder.
//!
//! Every variant is terminal for the operation that raised it; offsets in
//! this format are exact-or-wrong, so callers must not try to resynchronize
//! a cursor after a failure. The one designed-in tolerance for unknown
//! content is the registry's skip fallback, which is not an error path.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("not a ROOT container file (bad magic)")]
    BadMagic,

    #[error("unsupported format version {0}")]
    UnsupportedFormatVersion(u32),

    #[error("record at offset {at} carries no byte-count marker (legacy pre-versioning format)")]
    LegacyFormat { at: usize },

    #[error("truncated buffer: need {need} byte(s) at offset {at}, {left} left")]
    Truncated { at: usize, need: usize, left: usize },

    #[error("object of class [{class}] consumed {actual} byte(s), framing declares {expected}")]
    FramingViolation {
        class: String,
        expected: u64,
        actual: u64,
    },

    #[error("unknown class tag {tag:#010x} at offset {at}")]
    BadClassTag { tag: u32, at: usize },

    #[error("bad compression header: {0}")]
    BadCompressionHeader(String),

    #[error("inflate failure: {0}")]
    InflateFailure(String),

    #[error("unexpected root class [{0}], expected [TFile]")]
    UnexpectedRootClass(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
