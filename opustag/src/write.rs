use crate::constants::{ID3V1_TAG, OPUSTAGS};
use crate::error::{Error, Result};
use crate::read::{comment_span, read_from};
use crate::tag::VorbisComments;

use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use ogg_page::{
	CHECKSUM_POS, CONTINUED_PACKET, HEADER_TYPE_FLAG_POS, MAX_CONTENT_SIZE, MAX_SEGMENT_COUNT,
	MAX_SEGMENT_SIZE, PAGE_HEADER_FIXED_LENGTH, PageError, PageHeader, SEQUENCE_NUMBER_POS, crc32,
};

// How the new comment is laid out relative to the old one. Decided once
// per call; all three arms share the same page builder.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum RewriteStrategy {
	// New comment fits on one page, old one already did: replace the
	// second page, copy everything after it untouched.
	ReplacePage,
	// New comment fits on one page, old one spanned several: replace the
	// whole span with one page and renumber the rest.
	ReplaceAndRenumber,
	// New comment spans several pages: emit full pages plus a remainder,
	// then renumber the rest.
	Paginate,
}

/// Rewrites the comment block of an Ogg Opus stream
///
/// Copies `source` to `dest` with the comment packet replaced by `tag`,
/// re-paginating as needed. Every byte outside the comment span is
/// preserved, except the sequence number and checksum fields of pages
/// that move when the comment's page count changes. A legacy ID3v1 tag
/// trailing the last page is dropped from the copy.
///
/// `source` must be positioned at the start of the stream. On failure,
/// whatever was written to `dest` is invalid and must be discarded by the
/// caller; nothing is ever written back to `source`.
///
/// # Errors
///
/// * The stream is not a valid Ogg Opus stream ([`Error::Page`],
///   [`Error::MissingCommentHeader`])
/// * The comment does not fit the format's limits ([`Error::TooMuchData`])
/// * The trailing byte counts do not reconcile
///   ([`Error::WriteCountMismatch`])
/// * [`std::io::Error`]
pub fn write_to<R, W>(tag: &VorbisComments, source: &mut R, dest: &mut W) -> Result<()>
where
	R: Read + Seek,
	W: Write,
{
	// 1st page: identification header, copied verbatim
	let first_page = PageHeader::read(source)?;
	dest.write_all(first_page.raw())?;

	let mut first_content = vec![0; first_page.content_len() as usize];
	source.read_exact(&mut first_content)?;
	dest.write_all(&first_content)?;

	// 2nd page: anchor for the old comment
	let second_page = PageHeader::read(source)?;

	source.seek(SeekFrom::Start(0))?;
	let (span, sibling_lacing) = comment_span(source)?;

	let new_comment = create_comment_packet(tag)?;

	let strategy = if fits_on_single_page(new_comment.len()) {
		if second_page.last_packet_incomplete() {
			RewriteStrategy::ReplaceAndRenumber
		} else {
			RewriteStrategy::ReplacePage
		}
	} else {
		RewriteStrategy::Paginate
	};

	log::debug!(
		"Rewriting comment packet: {} bytes (was {}), strategy {:?}",
		new_comment.len(),
		span.packet_len,
		strategy
	);

	// Sibling packet data sharing the comment's final page survives the
	// rewrite with its lacing values carried over.
	let mut sibling = vec![0; span.sibling_len as usize];
	source.seek(SeekFrom::Start(span.sibling_start))?;
	source.read_exact(&mut sibling)?;

	// The read above leaves `source` at the first untouched page
	let mut sequence = second_page.sequence_number;

	match strategy {
		RewriteStrategy::ReplacePage | RewriteStrategy::ReplaceAndRenumber => {
			let mut lacing = segment_table(new_comment.len(), true);
			lacing.extend_from_slice(&sibling_lacing);

			let page = build_page(
				&second_page,
				sequence,
				false,
				&lacing,
				&[&new_comment, &sibling],
			)?;
			dest.write_all(&page)?;

			if strategy == RewriteStrategy::ReplacePage {
				// Page count is unchanged, later sequence numbers stay valid
				std::io::copy(source, dest)?;
			} else {
				copy_remaining(sequence + 1, source, dest)?;
			}
		},
		RewriteStrategy::Paginate => {
			let full_pages = new_comment.len() / MAX_CONTENT_SIZE;

			let mut offset = 0;
			for i in 0..full_pages {
				// Left open, the packet continues on the next page
				let lacing = segment_table(MAX_CONTENT_SIZE, false);

				let page = build_page(
					&second_page,
					sequence,
					i != 0,
					&lacing,
					&[&new_comment[offset..offset + MAX_CONTENT_SIZE]],
				)?;
				dest.write_all(&page)?;

				sequence += 1;
				offset += MAX_CONTENT_SIZE;
			}

			let remainder = &new_comment[offset..];
			if segments_needed(remainder.len()) + sibling_lacing.len() <= MAX_SEGMENT_COUNT {
				// Remainder and siblings share the final page
				let mut lacing = segment_table(remainder.len(), true);
				lacing.extend_from_slice(&sibling_lacing);

				let page =
					build_page(&second_page, sequence, true, &lacing, &[remainder, &sibling])?;
				dest.write_all(&page)?;
			} else {
				let lacing = segment_table(remainder.len(), true);
				let page = build_page(&second_page, sequence, true, &lacing, &[remainder])?;
				dest.write_all(&page)?;

				if !sibling.is_empty() {
					sequence += 1;
					let page =
						build_page(&second_page, sequence, false, &sibling_lacing, &[&sibling])?;
					dest.write_all(&page)?;
				}
			}

			copy_remaining(sequence + 1, source, dest)?;
		},
	}

	Ok(())
}

/// Removes the comment block of an Ogg Opus stream
///
/// Writes a copy of `source` to `dest` whose comment block holds zero
/// entries. The vendor string is preserved when the existing block is
/// readable. A stream whose second page lacks the `OpusTags` magic
/// cannot be rewritten and fails the same way [`write_to`] does.
///
/// # Errors
///
/// See [`write_to`]
pub fn delete_from<R, W>(source: &mut R, dest: &mut W) -> Result<()>
where
	R: Read + Seek,
	W: Write,
{
	let mut empty = VorbisComments::new();

	match read_from(source) {
		Ok(existing) => empty.vendor = existing.vendor,
		// An I/O failure is fatal; anything else means there is no
		// readable block, and the rewrite below decides the outcome
		Err(Error::Io(err)) => return Err(Error::Io(err)),
		Err(_) => {},
	}

	source.seek(SeekFrom::Start(0))?;
	write_to(&empty, source, dest)
}

/// Encodes `tag` and prepends the `OpusTags` magic
pub(crate) fn create_comment_packet(tag: &VorbisComments) -> Result<Vec<u8>> {
	let mut packet = Cursor::new(Vec::new());

	packet.write_all(OPUSTAGS)?;

	let vendor = tag.vendor().as_bytes();
	let Ok(vendor_len) = u32::try_from(vendor.len()) else {
		return Err(Error::TooMuchData);
	};

	packet.write_u32::<LittleEndian>(vendor_len)?;
	packet.write_all(vendor)?;

	// Zero out the item count for later; entries with an empty value are
	// not written
	let item_count_pos = packet.stream_position()?;
	packet.write_u32::<LittleEndian>(0)?;

	let mut count = 0_u32;
	for (k, v) in tag.items() {
		if v.is_empty() {
			continue;
		}

		let comment = format!("{k}={v}");
		let comment_bytes = comment.as_bytes();

		let Ok(bytes_len) = u32::try_from(comment_bytes.len()) else {
			return Err(Error::TooMuchData);
		};

		count += 1;

		packet.write_u32::<LittleEndian>(bytes_len)?;
		packet.write_all(comment_bytes)?;
	}

	packet.seek(SeekFrom::Start(item_count_pos))?;
	packet.write_u32::<LittleEndian>(count)?;

	Ok(packet.into_inner())
}

/// Creates lacing values for a packet of `length` bytes
///
/// Ogg has no packet length field; a packet is closed by the first lacing
/// value below 255. When `length` is an exact multiple of 255 the table
/// is ambiguous: `must_terminate` decides whether to close the packet
/// here with an explicit zero entry, or leave it open to continue on the
/// next page.
pub(crate) fn segment_table(length: usize, must_terminate: bool) -> Vec<u8> {
	// A zero-length packet still takes one lacing entry
	if length == 0 {
		return vec![0];
	}

	let mut table = vec![255; length / MAX_SEGMENT_SIZE];
	match length % MAX_SEGMENT_SIZE {
		0 if !must_terminate => {},
		last => table.push(last as u8),
	}

	table
}

// Lacing entries a terminated packet of `length` bytes takes up.
pub(crate) fn segments_needed(length: usize) -> usize {
	if length == 0 {
		return 1;
	}

	length / MAX_SEGMENT_SIZE + 1
}

/// Whether a terminated packet of `length` bytes fits one page's segment table
pub(crate) fn fits_on_single_page(length: usize) -> bool {
	segments_needed(length) <= MAX_SEGMENT_COUNT
}

// Zeroes the checksum field, recomputes it over the whole page, and
// stores it little-endian. Must run after all other header mutations.
pub(crate) fn apply_checksum(page: &mut [u8]) {
	page[CHECKSUM_POS..CHECKSUM_POS + 4].copy_from_slice(&[0; 4]);
	let crc = crc32(page);
	page[CHECKSUM_POS..CHECKSUM_POS + 4].copy_from_slice(&crc.to_le_bytes());
}

// Builds one finished page: granule position and serial are reused from
// `base`, the segment table and content are the caller's, and the flag,
// sequence number, and checksum are set last.
fn build_page(
	base: &PageHeader,
	sequence: u32,
	continued: bool,
	lacing: &[u8],
	content: &[&[u8]],
) -> Result<Vec<u8>> {
	if lacing.is_empty() || lacing.len() > MAX_SEGMENT_COUNT {
		return Err(Error::TooMuchData);
	}

	let content_len: usize = content.iter().map(|c| c.len()).sum();
	debug_assert_eq!(
		lacing.iter().map(|&b| usize::from(b)).sum::<usize>(),
		content_len
	);

	let mut page = Vec::with_capacity(PAGE_HEADER_FIXED_LENGTH + lacing.len() + content_len);
	page.extend_from_slice(&base.raw()[..PAGE_HEADER_FIXED_LENGTH - 1]);
	page.push(lacing.len() as u8);
	page.extend_from_slice(lacing);
	for fragment in content {
		page.extend_from_slice(fragment);
	}

	page[HEADER_TYPE_FLAG_POS] = if continued { CONTINUED_PACKET } else { 0 };
	page[SEQUENCE_NUMBER_POS..SEQUENCE_NUMBER_POS + 4].copy_from_slice(&sequence.to_le_bytes());

	apply_checksum(&mut page);
	Ok(page)
}

// Copies every page from the source's current position to `dest`,
// assigning sequence numbers from `sequence` upward and recomputing each
// checksum. A legacy ID3v1 tag at the end is dropped; any other parse
// failure is fatal. The trailing byte counts must reconcile exactly.
fn copy_remaining<R, W>(mut sequence: u32, source: &mut R, dest: &mut W) -> Result<()>
where
	R: Read + Seek,
	W: Write,
{
	let mut trailing = Vec::new();
	source.read_to_end(&mut trailing)?;
	let original_len = trailing.len() as u64;

	let mut reader = Cursor::new(&trailing[..]);
	let mut out = Vec::with_capacity(trailing.len());
	let mut discarded = 0_u64;

	while (reader.position() as usize) < trailing.len() {
		let page_start = reader.position() as usize;

		let header = match PageHeader::read(&mut reader) {
			Ok(header) => header,
			Err(err) => {
				let rest = &trailing[page_start..];
				if rest.len() >= ID3V1_TAG.len() && &rest[..ID3V1_TAG.len()] == ID3V1_TAG {
					log::debug!("Dropping {} bytes of trailing ID3v1 tag", rest.len());
					discarded = rest.len() as u64;
					break;
				}

				return Err(err.into());
			},
		};

		let content_len = header.content_len() as usize;
		let data_start = reader.position() as usize;
		let data_end = data_start + content_len;
		if data_end > trailing.len() {
			return Err(PageError::NotEnoughData.into());
		}

		let mut page = Vec::with_capacity(header.len() + content_len);
		page.extend_from_slice(header.raw());
		page.extend_from_slice(&trailing[data_start..data_end]);

		page[SEQUENCE_NUMBER_POS..SEQUENCE_NUMBER_POS + 4]
			.copy_from_slice(&sequence.to_le_bytes());
		sequence += 1;
		apply_checksum(&mut page);

		out.extend_from_slice(&page);
		reader.set_position(data_end as u64);
	}

	dest.write_all(&out)?;

	let written = out.len() as u64;
	if original_len != written + discarded {
		return Err(Error::WriteCountMismatch {
			expected: original_len,
			written,
			discarded,
		});
	}

	Ok(())
}
