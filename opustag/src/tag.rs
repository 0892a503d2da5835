/// A Vorbis comment block
///
/// The comment block of an Ogg Opus file: a vendor string naming the
/// encoding software, plus an ordered list of `FIELD=value` entries.
/// Field names are ASCII and compared case-insensitively, per the Vorbis
/// comment specification; entry order is preserved through a rewrite.
#[derive(Default, Clone, PartialEq, Eq, Debug)]
pub struct VorbisComments {
	/// An identifier for the encoding software
	pub(crate) vendor: String,
	/// A collection of key-value pairs
	pub(crate) items: Vec<(String, String)>,
}

impl VorbisComments {
	/// Create a new empty `VorbisComments`
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the vendor string
	pub fn vendor(&self) -> &str {
		&self.vendor
	}

	/// Sets the vendor string
	pub fn set_vendor(&mut self, vendor: String) {
		self.vendor = vendor
	}

	/// Returns an [`Iterator`] over the stored key/value pairs
	pub fn items(&self) -> impl ExactSizeIterator<Item = (&str, &str)> + Clone {
		self.items.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Gets an item by key, case-insensitively
	///
	/// If multiple items share the key, the first one is returned.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.items
			.iter()
			.find(|(k, _)| k.eq_ignore_ascii_case(key))
			.map(|(_, v)| v.as_str())
	}

	/// Gets all items with the key, case-insensitively
	pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + Clone + 'a {
		self.items
			.iter()
			.filter_map(move |(k, v)| (k.eq_ignore_ascii_case(key)).then_some(v.as_str()))
	}

	/// Appends an item
	///
	/// This will do nothing if the key is invalid. Field names must be
	/// non-empty printable ASCII, excluding `=`, as specified
	/// [here](https://xiph.org/vorbis/doc/v-comment.html#vectorformat).
	pub fn push(&mut self, key: String, value: String) {
		if !verify_key(&key) {
			return;
		}

		self.items.push((key, value))
	}

	/// Inserts an item
	///
	/// This is the same as [`VorbisComments::push`], except it will first
	/// remove any items with the same key.
	pub fn insert(&mut self, key: String, value: String) {
		if !verify_key(&key) {
			return;
		}

		self.items.retain(|(k, _)| !k.eq_ignore_ascii_case(&key));
		self.items.push((key, value))
	}

	/// Removes all items with a key, case-insensitively
	pub fn remove(&mut self, key: &str) {
		self.items.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
	}

	/// Returns the number of stored items
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Whether the tag contains no items
	///
	/// The vendor string is not considered; an empty tag may still carry
	/// one.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

fn verify_key(key: &str) -> bool {
	!key.is_empty()
		&& key
			.bytes()
			.all(|b| (0x20..=0x7D).contains(&b) && b != b'=')
}

#[cfg(test)]
mod tests {
	use super::VorbisComments;

	#[test]
	fn case_insensitive_lookup() {
		let mut tag = VorbisComments::new();
		tag.push(String::from("TITLE"), String::from("Title"));

		assert_eq!(tag.get("title"), Some("Title"));
		assert_eq!(tag.get("Title"), Some("Title"));
		assert_eq!(tag.get("ARTIST"), None);
	}

	#[test]
	fn push_preserves_duplicates_insert_replaces() {
		let mut tag = VorbisComments::new();
		tag.push(String::from("GENRE"), String::from("Ambient"));
		tag.push(String::from("genre"), String::from("Drone"));

		assert_eq!(tag.get_all("GENRE").count(), 2);

		tag.insert(String::from("GENRE"), String::from("Noise"));
		assert_eq!(tag.get_all("GENRE").collect::<Vec<_>>(), ["Noise"]);
	}

	#[test]
	fn invalid_keys_rejected() {
		let mut tag = VorbisComments::new();
		tag.push(String::new(), String::from("v"));
		tag.push(String::from("A=B"), String::from("v"));
		tag.push(String::from("née"), String::from("v"));

		assert!(tag.is_empty());
	}

	#[test]
	fn remove_is_case_insensitive() {
		let mut tag = VorbisComments::new();
		tag.push(String::from("Album"), String::from("x"));
		tag.push(String::from("ALBUM"), String::from("y"));
		tag.remove("album");

		assert_eq!(tag.len(), 0);
	}
}
