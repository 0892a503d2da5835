// OGG pages use an unreflected CRC-32 with polynomial 0x04c11db7,
// an initial value of 0, and no final XOR.
// https://www.xiph.org/ogg/doc/framing.html

const fn table_entry(idx: u32) -> u32 {
	let mut r = idx << 24;
	let mut i = 0;
	while i < 8 {
		if r & 0x8000_0000 != 0 {
			r = (r << 1) ^ 0x04c1_1db7;
		} else {
			r <<= 1;
		}
		i += 1;
	}
	r
}

const fn build_table() -> [u32; 256] {
	let mut table = [0; 256];
	let mut i = 0;
	while i < 256 {
		table[i] = table_entry(i as u32);
		i += 1;
	}
	table
}

const CRC_TABLE: [u32; 256] = build_table();

/// Computes the OGG variant of CRC-32 over `data`
///
/// When checksumming a page, the 4-byte checksum field must be zeroed
/// beforehand, and the result is stored little-endian.
pub fn crc32(data: &[u8]) -> u32 {
	let mut crc = 0_u32;
	for &byte in data {
		crc = (crc << 8) ^ CRC_TABLE[(((crc >> 24) ^ u32::from(byte)) & 0xFF) as usize];
	}
	crc
}

#[cfg(test)]
mod tests {
	use super::crc32;
	use crate::CHECKSUM_POS;

	// A real Opus identification page, checksum field zeroed
	fn opus_ident_page() -> Vec<u8> {
		let mut page = Vec::new();
		page.extend(b"OggS");
		page.push(0);
		page.push(2);
		page.extend(0_u64.to_le_bytes());
		page.extend(1_759_377_061_u32.to_le_bytes());
		page.extend(0_u32.to_le_bytes());
		page.extend(0_u32.to_le_bytes());
		page.push(1);
		page.push(0x13);
		page.extend([
			0x4F, 0x70, 0x75, 0x73, 0x48, 0x65, 0x61, 0x64, 0x01, 0x02, 0x38, 0x01, 0x80, 0xBB,
			0, 0, 0, 0, 0,
		]);
		page
	}

	#[test]
	fn known_page_checksum() {
		assert_eq!(crc32(&opus_ident_page()), 3_579_522_525);
	}

	#[test]
	fn deterministic() {
		let page = opus_ident_page();
		assert_eq!(crc32(&page), crc32(&page));
	}

	#[test]
	fn sensitive_to_any_byte() {
		let page = opus_ident_page();
		let original = crc32(&page);

		// Bump the sequence number
		let mut altered = page;
		altered[CHECKSUM_POS - 4] ^= 1;
		assert_ne!(crc32(&altered), original);
	}
}
