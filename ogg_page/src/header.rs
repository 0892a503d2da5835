use crate::error::{PageError, Result};
use crate::{MAX_SEGMENT_SIZE, PAGE_HEADER_FIXED_LENGTH};

use std::io::{Read, Seek};

use byteorder::{ByteOrder, LittleEndian};

/// A packet boundary within a page's content
///
/// Offsets are relative to the start of the page's content, not the page
/// itself.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PacketSpan {
	/// Offset of the packet's first byte within the page content
	pub start: u64,
	/// Number of bytes the packet occupies on this page
	pub len: u64,
}

/// An OGG page header
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PageHeader {
	/// The position in the stream the page started at
	pub start: u64,
	/// The page's header type flag
	pub header_type_flag: u8,
	/// The page's absolute granule position
	pub abgp: u64,
	/// The page's stream serial number
	pub stream_serial: u32,
	/// The page's sequence number
	pub sequence_number: u32,
	/// The page's checksum, as stored in the stream
	pub checksum: u32,
	raw: Vec<u8>,
	segment_table: Vec<u8>,
	packets: Vec<PacketSpan>,
	last_packet_incomplete: bool,
}

impl PageHeader {
	/// Attempts to read a page header from a reader
	///
	/// This leaves the reader positioned at the start of the page content.
	///
	/// # Errors
	///
	/// * The capture pattern is not `OggS` ([`PageError::MissingMagic`])
	/// * The version is nonzero ([`PageError::InvalidVersion`])
	/// * The segment count is zero ([`PageError::BadSegmentCount`])
	/// * [`std::io::Error`]
	pub fn read<R>(data: &mut R) -> Result<Self>
	where
		R: Read + Seek,
	{
		let start = data.stream_position()?;

		let mut fixed = [0; PAGE_HEADER_FIXED_LENGTH];
		data.read_exact(&mut fixed)?;

		if &fixed[..4] != b"OggS" {
			return Err(PageError::MissingMagic);
		}

		// Version, always 0
		if fixed[4] != 0 {
			return Err(PageError::InvalidVersion);
		}

		let header_type_flag = fixed[5];
		let abgp = LittleEndian::read_u64(&fixed[6..14]);
		let stream_serial = LittleEndian::read_u32(&fixed[14..18]);
		let sequence_number = LittleEndian::read_u32(&fixed[18..22]);
		let checksum = LittleEndian::read_u32(&fixed[22..26]);

		let segments = fixed[26];
		if segments < 1 {
			return Err(PageError::BadSegmentCount);
		}

		let mut segment_table = vec![0; usize::from(segments)];
		data.read_exact(&mut segment_table)?;

		let mut raw = fixed.to_vec();
		raw.extend_from_slice(&segment_table);

		let (packets, last_packet_incomplete) = packet_spans(&segment_table);

		Ok(Self {
			start,
			header_type_flag,
			abgp,
			stream_serial,
			sequence_number,
			checksum,
			raw,
			segment_table,
			packets,
			last_packet_incomplete,
		})
	}

	/// Returns the raw header bytes, including the segment table
	///
	/// These are the bytes as read, so the checksum field still holds the
	/// stream's value.
	pub fn raw(&self) -> &[u8] {
		&self.raw
	}

	/// Returns the length of the header in bytes, including the segment table
	pub fn len(&self) -> usize {
		self.raw.len()
	}

	/// Returns the page's segment table
	pub fn segment_table(&self) -> &[u8] {
		&self.segment_table
	}

	/// Returns the declared length of the page content in bytes
	pub fn content_len(&self) -> u64 {
		self.segment_table.iter().map(|&b| u64::from(b)).sum()
	}

	/// Returns the packet boundaries implied by the segment table
	///
	/// The final span covers only the bytes present on this page; whether
	/// the packet actually ends here is reported by
	/// [`PageHeader::last_packet_incomplete`].
	pub fn packets(&self) -> &[PacketSpan] {
		&self.packets
	}

	/// Whether the last packet on this page continues on the next page
	pub fn last_packet_incomplete(&self) -> bool {
		self.last_packet_incomplete
	}

	/// Whether the first packet on this page continues on the next page
	pub fn first_packet_incomplete(&self) -> bool {
		self.packets.len() == 1 && self.last_packet_incomplete
	}
}

// A lacing value below 255 closes the current packet. A table ending on
// 255 leaves its final packet open, to be continued on the next page.
fn packet_spans(segment_table: &[u8]) -> (Vec<PacketSpan>, bool) {
	let mut packets = Vec::new();
	let mut start = 0_u64;
	let mut len = 0_u64;

	for &lace in segment_table {
		len += u64::from(lace);
		if usize::from(lace) < MAX_SEGMENT_SIZE {
			packets.push(PacketSpan { start, len });
			start += len;
			len = 0;
		}
	}

	if len > 0 {
		packets.push(PacketSpan { start, len });
		return (packets, true);
	}

	(packets, false)
}

#[cfg(test)]
mod tests {
	use super::{PacketSpan, PageHeader};
	use crate::PageError;

	use std::io::Cursor;

	fn page(header_type: u8, sequence: u32, segment_table: &[u8]) -> Vec<u8> {
		let mut bytes = Vec::new();
		bytes.extend(b"OggS");
		bytes.push(0);
		bytes.push(header_type);
		bytes.extend(0_u64.to_le_bytes());
		bytes.extend(1234_u32.to_le_bytes());
		bytes.extend(sequence.to_le_bytes());
		bytes.extend(0_u32.to_le_bytes());
		bytes.push(segment_table.len() as u8);
		bytes.extend(segment_table);

		let content_len = segment_table.iter().map(|&b| usize::from(b)).sum();
		bytes.extend(std::iter::repeat_n(0xAB_u8, content_len));
		bytes
	}

	#[test]
	fn two_complete_packets() {
		let bytes = page(0, 3, &[255, 10, 7]);
		let header = PageHeader::read(&mut Cursor::new(bytes)).unwrap();

		assert_eq!(header.sequence_number, 3);
		assert_eq!(header.stream_serial, 1234);
		assert_eq!(header.content_len(), 272);
		assert_eq!(
			header.packets(),
			[
				PacketSpan { start: 0, len: 265 },
				PacketSpan { start: 265, len: 7 }
			]
		);
		assert!(!header.last_packet_incomplete());
		assert!(!header.first_packet_incomplete());
	}

	#[test]
	fn continued_packet() {
		let bytes = page(0, 7, &[255, 255]);
		let header = PageHeader::read(&mut Cursor::new(bytes)).unwrap();

		assert_eq!(header.packets(), [PacketSpan { start: 0, len: 510 }]);
		assert!(header.last_packet_incomplete());
		assert!(header.first_packet_incomplete());
	}

	#[test]
	fn complete_first_incomplete_last() {
		let bytes = page(0, 7, &[12, 255]);
		let header = PageHeader::read(&mut Cursor::new(bytes)).unwrap();

		assert!(header.last_packet_incomplete());
		assert!(!header.first_packet_incomplete());
	}

	#[test]
	fn terminating_zero_closes_packet() {
		let bytes = page(0, 0, &[255, 0]);
		let header = PageHeader::read(&mut Cursor::new(bytes)).unwrap();

		assert_eq!(header.packets(), [PacketSpan { start: 0, len: 255 }]);
		assert!(!header.last_packet_incomplete());
	}

	#[test]
	fn raw_round_trip() {
		let bytes = page(2, 0, &[32, 17]);
		let header = PageHeader::read(&mut Cursor::new(bytes.clone())).unwrap();

		assert_eq!(header.len(), 27 + 2);
		assert_eq!(header.raw(), &bytes[..29]);
	}

	#[test]
	fn rejects_bad_magic() {
		let mut bytes = page(0, 0, &[1]);
		bytes[0] = b'X';

		match PageHeader::read(&mut Cursor::new(bytes)) {
			Err(PageError::MissingMagic) => {},
			other => panic!("expected MissingMagic, got {:?}", other),
		}
	}

	#[test]
	fn rejects_bad_version() {
		let mut bytes = page(0, 0, &[1]);
		bytes[4] = 1;

		match PageHeader::read(&mut Cursor::new(bytes)) {
			Err(PageError::InvalidVersion) => {},
			other => panic!("expected InvalidVersion, got {:?}", other),
		}
	}

	#[test]
	fn rejects_zero_segments() {
		let mut bytes = page(0, 0, &[1]);
		bytes[26] = 0;

		match PageHeader::read(&mut Cursor::new(bytes)) {
			Err(PageError::BadSegmentCount) => {},
			other => panic!("expected BadSegmentCount, got {:?}", other),
		}
	}
}
