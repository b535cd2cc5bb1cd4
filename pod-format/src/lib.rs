//! The `pod` module container format.
//!
//! A pod is a random-access archive of uniquely named entries, used to ship
//! compiled reed modules. Use [`Pod`] to build, load, persist and extract
//! containers; entry payloads are streamed, never loaded whole.

mod container;
mod de;
mod entry;
mod error;
mod header;
pub mod path;
mod ser;

pub use container::{Pod, PayloadReader};
pub use entry::{Entry, Payload};
pub use error::Error;
pub use header::{FORMAT_VERSION, POD_EXTENSION};
pub use path::EntryPath;

pub type Result<T> = std::result::Result<T, Error>;
