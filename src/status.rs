/*!
# Status codes

A pure mapping from [`crate::Error`] to the enumerated status codes of §6 of
the specification, for callers (e.g. a future FFI layer) that want the
C-style status codes rather than a Rust `Result`. The translation engine
itself never uses this type internally; it reports errors as `Result<_,
Error>` per §7.
*/
use crate::error::{Error, InternalError};

/// Status codes mirroring srcML's public API surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
	Ok,
	InvalidArgument,
	InvalidIoOperation,
	UninitializedUnit,
	UnsetLanguage,
	IoError,
	Error,
}

impl Status {
	/// Map an `Error` to its corresponding status code.
	pub fn from_error(e: &Error) -> Status {
		match e {
			Error::Input(_) => Status::InvalidIoOperation,
			Error::Encoding(_) => Status::InvalidIoOperation,
			Error::LanguageUnset => Status::UnsetLanguage,
			Error::InvalidArgument(_) => Status::InvalidArgument,
			Error::UninitializedUnit => Status::UninitializedUnit,
			Error::Transform(_) => Status::Error,
			Error::Internal(InternalError::ModeStackUnderflow)
			| Error::Internal(InternalError::CounterUnderflow(_))
			| Error::Internal(InternalError::ElementMismatch) => Status::Error,
			Error::Io(_) => Status::IoError,
		}
	}
}

impl From<&Error> for Status {
	fn from(e: &Error) -> Status {
		Status::from_error(e)
	}
}

impl<T> From<&crate::error::Result<T>> for Status {
	fn from(r: &crate::error::Result<T>) -> Status {
		match r {
			Ok(_) => Status::Ok,
			Err(e) => Status::from_error(e),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ok_result_maps_to_ok() {
		let r: crate::error::Result<()> = Ok(());
		assert_eq!(Status::from(&r), Status::Ok);
	}

	#[test]
	fn language_unset_maps_correctly() {
		assert_eq!(Status::from_error(&Error::LanguageUnset), Status::UnsetLanguage);
	}

	#[test]
	fn io_error_maps_correctly() {
		let e = Error::io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
		assert_eq!(Status::from_error(&e), Status::IoError);
	}
}
