//! Audio tag extraction for podsync
//!
//! Reads title/artist/album/genre tags and stream properties with lofty, and
//! pulls embedded front covers out as JPEG thumbnails.
//!
//! # Example
//!
//! ```rust,no_run
//! use pod_core::TagReader;
//! use pod_tags::LoftyTagReader;
//! use std::path::Path;
//!
//! let reader = LoftyTagReader::new();
//! if reader.is_audio_file(Path::new("/music/song.mp3")) {
//!     let tags = reader.read_tags(Path::new("/music/song.mp3")).unwrap();
//!     println!("{:?}", tags.title);
//! }
//! ```

mod artwork;
mod error;
mod reader;

pub use artwork::{save_jpeg, MAX_ARTWORK_SIZE};
pub use error::{Result, TagError};
pub use reader::LoftyTagReader;
