//! Read and rewrite the comment block of Ogg Opus files
//!
//! An Ogg Opus file carries its metadata as a Vorbis comment block
//! (vendor string plus an ordered list of `FIELD=value` entries) in the
//! `OpusTags` packet, which starts on the second page of the stream and
//! may span any number of pages. This crate locates that packet, decodes
//! it into a [`VorbisComments`], and rewrites it in place of the old one
//! while leaving every other byte of the file untouched.
//!
//! Rewriting re-paginates the comment packet as needed, recomputes the
//! checksum of every page it emits, and renumbers all following pages
//! whenever the page count changes, so the output remains a conformant
//! Ogg stream. The destination is only valid if the call returns
//! successfully; on any error the partial output must be discarded.
//!
//! ```rust,ignore
//! use opustag::VorbisComments;
//!
//! let mut source = std::fs::File::open("song.opus")?;
//! let mut tag = opustag::read_from(&mut source)?;
//!
//! tag.insert(String::from("TITLE"), String::from("Title"));
//!
//! source.rewind()?;
//! let mut dest = tempfile::NamedTempFile::new()?;
//! opustag::write_to(&tag, &mut source, dest.as_file_mut())?;
//! dest.persist("song.opus")?;
//! ```

mod constants;
mod error;
mod read;
mod tag;
mod write;

pub use error::{Error, Result};
pub use read::read_from;
pub use tag::VorbisComments;
pub use write::{delete_from, write_to};
