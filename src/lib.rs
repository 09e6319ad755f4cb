pub mod cursor;
pub mod directory;
pub mod error;
pub mod file;
pub mod key;
pub mod objects;
pub mod record;
pub mod registry;
pub mod unzip;

#[cfg(test)]
mod testutil;

pub use cursor::Cursor;
pub use directory::Directory;
pub use error::{Error, Result};
pub use file::{File, Header};
pub use key::Key;
pub use record::{ClassTag, RecordHeader};
pub use registry::{Context, Decode, RawSkip, Registry};
