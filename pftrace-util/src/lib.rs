//! Utilities

// Modules
pub mod logger;

// Imports
use std::{cell::RefCell, fmt, io};

/// Extension trait for `R: io::Read` types to read a byte array
#[extend::ext(name = ReadByteArray)]
pub impl<R: io::Read> R {
	/// Reads a byte array `[u8; N]` from this reader.
	///
	/// Returns `Err` if unable to read exactly `N` bytes.
	fn read_byte_array<const N: usize>(&mut self) -> Result<[u8; N], io::Error> {
		let mut array = [0u8; N];
		self.read_exact(&mut array)?;
		Ok(array)
	}
}

/// Extension trait for `R: io::Read` types to fill a buffer until end-of-file
#[extend::ext(name = ReadFull)]
pub impl<R: io::Read> R {
	/// Reads into `buf` until it's full or the reader is exhausted.
	///
	/// Returns the number of bytes read. Unlike [`io::Read::read_exact`], a
	/// short read isn't an error, which lets callers tell a clean end-of-file
	/// (`0`) apart from a truncated block (`0 < n < buf.len()`).
	fn read_full(&mut self, buf: &mut [u8]) -> Result<usize, io::Error> {
		let mut filled = 0;
		while filled < buf.len() {
			match self.read(&mut buf[filled..]) {
				Ok(0) => break,
				Ok(len) => filled += len,
				Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
				Err(err) => return Err(err),
			}
		}

		Ok(filled)
	}
}

/// [`fmt::Display`] helper to display using a `FnMut(&mut fmt::Formatter)`
pub struct DisplayWrapper<F: FnMut(&mut fmt::Formatter) -> fmt::Result>(RefCell<F>);

impl<F: FnMut(&mut fmt::Formatter) -> fmt::Result> DisplayWrapper<F> {
	/// Creates a new display wrapper
	#[must_use]
	pub const fn new(func: F) -> Self {
		Self(RefCell::new(func))
	}
}


impl<F: FnMut(&mut fmt::Formatter) -> fmt::Result> fmt::Display for DisplayWrapper<F> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		// Note: `f` cannot be re-entrant, so this cannot fail
		self.0.borrow_mut()(f)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn read_full_reports_short_reads() {
		let mut reader: &[u8] = &[1, 2, 3];
		let mut buf = [0u8; 5];
		assert_eq!(reader.read_full(&mut buf).unwrap(), 3);
		assert_eq!(&buf[..3], &[1, 2, 3]);
		assert_eq!(reader.read_full(&mut buf).unwrap(), 0);
	}

	#[test]
	fn read_byte_array_fails_on_short_input() {
		let mut reader: &[u8] = &[1, 2];
		assert_eq!(reader.read_byte_array::<2>().unwrap(), [1, 2]);
		assert!(reader.read_byte_array::<1>().is_err());
	}

	#[test]
	fn display_wrapper_forwards() {
		let wrapper = DisplayWrapper::new(|f| write!(f, "{}-{}", 1, 2));
		assert_eq!(wrapper.to_string(), "1-2");
	}
}
