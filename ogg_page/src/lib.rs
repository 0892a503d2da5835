//! OGG page header parsing and checksumming
//!
//! This crate covers the container-framing side of an OGG stream: reading
//! a page header (capture pattern, header type flags, granule position,
//! serial/sequence numbers, checksum, segment table) and computing the
//! OGG variant of CRC-32 over a full page.
//!
//! Packet boundaries are derived from the segment table at read time, so
//! callers can tell whether a page's packets complete on the page or
//! continue onto the next one.

mod crc;
mod error;
mod header;

pub use crc::crc32;
pub use error::{PageError, Result};
pub use header::{PacketSpan, PageHeader};

/// Length of a page header, excluding the segment table
pub const PAGE_HEADER_FIXED_LENGTH: usize = 27;

/// The maximum value of a single lacing entry
pub const MAX_SEGMENT_SIZE: usize = 255;

/// The maximum number of lacing entries in a page's segment table
pub const MAX_SEGMENT_COUNT: usize = 255;

/// The maximum content size addressable by a single page's segment table
pub const MAX_CONTENT_SIZE: usize = MAX_SEGMENT_SIZE * MAX_SEGMENT_COUNT;

/// Offset of the header type flag within a page
pub const HEADER_TYPE_FLAG_POS: usize = 5;

/// Offset of the page sequence number within a page
pub const SEQUENCE_NUMBER_POS: usize = 18;

/// Offset of the checksum within a page
pub const CHECKSUM_POS: usize = 22;

/// The page's first packet is a continuation from the previous page
pub const CONTINUED_PACKET: u8 = 0x01;

/// The page is the first page of the logical bitstream
pub const FIRST_PAGE_OF_BITSTREAM: u8 = 0x02;

/// The page is the last page of the logical bitstream
pub const LAST_PAGE_OF_BITSTREAM: u8 = 0x04;
