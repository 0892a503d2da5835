// https://datatracker.ietf.org/doc/pdf/rfc7845.pdf#section-5.2
pub(crate) const OPUSTAGS: &[u8] = b"OpusTags";

// Marker of a legacy ID3v1 tag appended after the last page. Unrelated
// to the Ogg framing; only recognized so it can be stripped on rewrite.
pub(crate) const ID3V1_TAG: &[u8] = b"TAG";
