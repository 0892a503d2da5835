use std::error::Error as StdError;
use std::fmt;

use ogg_page::PageError;

/// Alias for `Result<T, Error>`
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or rewriting a comment block
#[derive(Debug)]
pub enum Error {
	/// The second page's first packet does not start with `OpusTags`
	MissingCommentHeader,
	/// The comment block cannot be represented within the format's limits
	TooMuchData,
	/// A length declared inside the comment payload exceeds the payload
	SizeMismatch,
	/// Fewer trailing bytes were written than the source contained
	WriteCountMismatch {
		/// Trailing bytes in the source, measured from the end of the old
		/// comment span
		expected: u64,
		/// Trailing bytes written to the destination
		written: u64,
		/// Bytes dropped with a legacy trailing tag
		discarded: u64,
	},
	/// Errors that arise while parsing OGG pages
	Page(PageError),
	/// Unable to convert bytes to a String
	StringFromUtf8(std::string::FromUtf8Error),
	/// Any std::io::Error
	Io(std::io::Error),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::MissingCommentHeader => {
				write!(f, "Cannot find comment block (no OpusTags header)")
			},
			Error::TooMuchData => write!(f, "Too much data was provided"),
			Error::SizeMismatch => {
				write!(f, "Expected the data to be a different size than provided")
			},
			Error::WriteCountMismatch {
				expected,
				written,
				discarded,
			} => {
				write!(
					f,
					"File written counts don't match, file not written (expected: {}, written: \
					 {}, discarded: {})",
					expected, written, discarded
				)
			},
			Error::Page(err) => write!(f, "{}", err),
			Error::StringFromUtf8(err) => write!(f, "{}", err),
			Error::Io(err) => write!(f, "{}", err),
		}
	}
}

impl StdError for Error {
	fn source(&self) -> Option<&(dyn StdError + 'static)> {
		match *self {
			Error::Page(ref e) => Some(e),
			Error::StringFromUtf8(ref e) => Some(e),
			Error::Io(ref e) => Some(e),
			_ => None,
		}
	}
}

impl From<PageError> for Error {
	fn from(err: PageError) -> Error {
		Error::Page(err)
	}
}

impl From<std::string::FromUtf8Error> for Error {
	fn from(err: std::string::FromUtf8Error) -> Error {
		Error::StringFromUtf8(err)
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Error {
		Error::Io(err)
	}
}
