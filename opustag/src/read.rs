use crate::constants::OPUSTAGS;
use crate::error::{Error, Result};
use crate::tag::VorbisComments;

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use ogg_page::PageHeader;

/// Reads the comment block of an Ogg Opus stream
///
/// The reader must be positioned at the start of the stream. The first
/// page (the identification header) is skipped over; the comment packet
/// is expected to start the second page and is reassembled across as many
/// pages as it spans.
///
/// # Errors
///
/// * The stream is not a parseable Ogg stream ([`Error::Page`])
/// * The second page does not start with `OpusTags`
///   ([`Error::MissingCommentHeader`])
/// * The comment payload is malformed ([`Error::SizeMismatch`],
///   [`Error::StringFromUtf8`])
/// * [`std::io::Error`]
pub fn read_from<R>(data: &mut R) -> Result<VorbisComments>
where
	R: Read + Seek,
{
	let packet = read_comment_packet(data)?;
	let len = packet.len() as u64;
	read_comments(&mut &packet[..], len)
}

// Reassembles the comment packet, with the leading magic stripped.
fn read_comment_packet<R>(data: &mut R) -> Result<Vec<u8>>
where
	R: Read + Seek,
{
	// 1st page: identification header, skipped via its declared length
	let first_page = PageHeader::read(data)?;
	data.seek(SeekFrom::Current(first_page.content_len() as i64))?;

	// 2nd page: the comment packet starts here
	let mut page = PageHeader::read(data)?;

	let first_packet = page.packets()[0];
	if first_packet.len < OPUSTAGS.len() as u64 {
		return Err(Error::MissingCommentHeader);
	}

	let mut sig = [0; 8];
	data.read_exact(&mut sig)?;

	if sig != OPUSTAGS {
		return Err(Error::MissingCommentHeader);
	}
	let mut packet = vec![0; (first_packet.len as usize) - OPUSTAGS.len()];
	data.read_exact(&mut packet)?;

	// Keep appending the first packet of each following page until one
	// reports the packet closed.
	while page.first_packet_incomplete() {
		page = PageHeader::read(data)?;

		let continued = page.packets()[0];
		let mut fragment = vec![0; continued.len as usize];
		data.read_exact(&mut fragment)?;
		packet.extend_from_slice(&fragment);
	}

	Ok(packet)
}

/// The byte span occupied by the comment packet in the source stream
#[derive(Copy, Clone, Debug)]
pub(crate) struct CommentSpan {
	/// Length of the comment packet in bytes, magic included
	pub(crate) packet_len: u64,
	/// Absolute offset of the first byte after the comment packet
	pub(crate) sibling_start: u64,
	/// Bytes between the end of the comment and the end of its final page
	pub(crate) sibling_len: u64,
	/// Absolute offset of the first page after the comment's final page
	pub(crate) trailing_start: u64,
}

/// Measures the comment packet without consuming the stream
///
/// Walks pages from the reader's current position (which must be the
/// start of the stream) and reports the comment packet's length along
/// with the byte ranges the rewriter needs: any sibling packet data
/// sharing the comment's final page, and where the untouched trailing
/// pages begin. The reader's position is restored before returning.
///
/// The sibling lacing values are returned separately so a rebuilt page
/// can keep the sibling packets' boundaries intact.
pub(crate) fn comment_span<R>(data: &mut R) -> Result<(CommentSpan, Vec<u8>)>
where
	R: Read + Seek,
{
	let entry_pos = data.stream_position()?;

	let first_page = PageHeader::read(data)?;
	data.seek(SeekFrom::Current(first_page.content_len() as i64))?;

	let mut page = PageHeader::read(data)?;

	if page.packets()[0].len < OPUSTAGS.len() as u64 {
		return Err(Error::MissingCommentHeader);
	}

	let mut sig = [0; 8];
	data.read_exact(&mut sig)?;

	if sig != OPUSTAGS {
		return Err(Error::MissingCommentHeader);
	}

	data.seek(SeekFrom::Current(-(OPUSTAGS.len() as i64)))?;

	let mut packet_len = 0_u64;
	loop {
		let fragment = page.packets()[0];
		packet_len += fragment.len;
		data.seek(SeekFrom::Current(fragment.len as i64))?;

		if !page.first_packet_incomplete() {
			break;
		}

		page = PageHeader::read(data)?;
	}

	// The comment ends on `page`; whatever follows it there is sibling
	// packet data, covered by the lacing entries after the comment's.
	let sibling_start = data.stream_position()?;
	let page_end = page.start + page.len() as u64 + page.content_len();

	let mut consumed = 0;
	for &lace in page.segment_table() {
		consumed += 1;
		if usize::from(lace) < ogg_page::MAX_SEGMENT_SIZE {
			break;
		}
	}
	let sibling_lacing = page.segment_table()[consumed..].to_vec();

	let span = CommentSpan {
		packet_len,
		sibling_start,
		sibling_len: page_end - sibling_start,
		trailing_start: page_end,
	};

	data.seek(SeekFrom::Start(entry_pos))?;
	Ok((span, sibling_lacing))
}

/// Decodes a comment payload (vendor string + entry list), magic excluded
pub(crate) fn read_comments<R>(data: &mut R, mut len: u64) -> Result<VorbisComments>
where
	R: Read,
{
	let vendor_len = data.read_u32::<LittleEndian>()?;
	if u64::from(vendor_len) > len {
		return Err(Error::SizeMismatch);
	}

	let mut vendor_bytes = vec![0; vendor_len as usize];
	data.read_exact(&mut vendor_bytes)?;

	len -= u64::from(vendor_len);

	let vendor = String::from_utf8(vendor_bytes)?;

	let number_of_items = data.read_u32::<LittleEndian>()?;
	if u64::from(number_of_items) > len >> 2 {
		return Err(Error::SizeMismatch);
	}

	let mut tag = VorbisComments {
		vendor,
		items: Vec::with_capacity(number_of_items as usize),
	};

	for _ in 0..number_of_items {
		let comment_len = data.read_u32::<LittleEndian>()?;
		if u64::from(comment_len) > len {
			return Err(Error::SizeMismatch);
		}

		let mut comment_bytes = vec![0; comment_len as usize];
		data.read_exact(&mut comment_bytes)?;

		len -= u64::from(comment_len);

		// KEY=VALUE
		let mut comment_split = comment_bytes.splitn(2, |b| *b == b'=');

		let Some(key) = comment_split.next() else {
			continue;
		};

		let Some(value) = comment_split.next() else {
			log::warn!("No separator found in field, discarding");
			continue;
		};

		tag.items.push((
			String::from_utf8(key.to_vec())?,
			String::from_utf8(value.to_vec())?,
		));
	}

	Ok(tag)
}

#[cfg(test)]
mod tests {
	use super::read_comments;
	use crate::error::Error;

	#[test]
	fn vendor_length_is_bounded() {
		// Declares a 200-byte vendor in a 12-byte payload
		let mut payload = Vec::new();
		payload.extend(200_u32.to_le_bytes());
		payload.extend([0; 8]);

		let len = payload.len() as u64;
		match read_comments(&mut &payload[..], len) {
			Err(Error::SizeMismatch) => {},
			other => panic!("expected SizeMismatch, got {:?}", other),
		}
	}

	#[test]
	fn separator_less_entry_is_skipped() {
		let mut payload = Vec::new();
		payload.extend(3_u32.to_le_bytes());
		payload.extend(b"enc");
		payload.extend(2_u32.to_le_bytes());
		payload.extend(7_u32.to_le_bytes());
		payload.extend(b"TITLE=x");
		payload.extend(5_u32.to_le_bytes());
		payload.extend(b"BOGUS");

		let len = payload.len() as u64;
		let tag = read_comments(&mut &payload[..], len).unwrap();

		assert_eq!(tag.vendor(), "enc");
		assert_eq!(tag.len(), 1);
		assert_eq!(tag.get("TITLE"), Some("x"));
	}
}
