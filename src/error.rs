/*!
# Error types

This module holds the error types returned by the various functions of this
crate: the translation engine's `Error`, its `InternalError` subvariant for
invariant violations (mode-stack underflow, unmatched open elements), and the
`Result` alias used throughout.
*/
use std::error;
use std::fmt;
use std::io;
use std::ops::Deref;
use std::result::Result as StdResult;
use std::sync::Arc;

/// Violation of an internal invariant of the translation engine.
///
/// These are programming errors in the engine or in a `LanguageGrammar`
/// implementation, never a consequence of malformed source input (the lexer
/// and parser never reject source; see [`crate::parser::StreamParser`]).
#[derive(Debug, Clone, PartialEq, Copy)]
pub enum InternalError {
	/// A `ModeStack::pop` (or `end_current_mode`) was attempted with only
	/// one frame remaining, or on an empty stack.
	ModeStackUnderflow,

	/// A counter (parenthesis, brace or type count) was decremented below
	/// zero.
	CounterUnderflow(&'static str),

	/// An `END` markup token did not match the type on top of the
	/// open-element stack of the current mode.
	ElementMismatch,
}

impl error::Error for InternalError {}

impl fmt::Display for InternalError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			InternalError::ModeStackUnderflow => {
				f.write_str("mode stack underflow: attempt to pop the last frame")
			}
			InternalError::CounterUnderflow(which) => {
				write!(f, "{} counter underflow", which)
			}
			InternalError::ElementMismatch => {
				f.write_str("end-element token does not match innermost open element")
			}
		}
	}
}

/// `Arc`-based wrapper around [`std::io::Error`] to allow cloning.
#[derive(Clone)]
pub struct IOErrorWrapper(Arc<io::Error>);

impl IOErrorWrapper {
	fn wrap(e: io::Error) -> IOErrorWrapper {
		IOErrorWrapper(Arc::new(e))
	}
}

impl fmt::Debug for IOErrorWrapper {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Debug::fmt(&**self, f)
	}
}

impl fmt::Display for IOErrorWrapper {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Display::fmt(&**self, f)
	}
}

impl PartialEq for IOErrorWrapper {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl Deref for IOErrorWrapper {
	type Target = io::Error;

	fn deref(&self) -> &io::Error {
		&*self.0
	}
}

/// Error types which may be returned from any engine operation.
///
/// With the exception of [`Error::Io`], errors are fatal to the translation
/// in progress: the parser and lexer never reject malformed source (they
/// emit it as literal text instead), so only I/O failures, encoding
/// failures, unresolved language, transform failures and internal-invariant
/// violations surface here.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
	/// Could not open or read the source (filename, file handle, file
	/// descriptor or buffer). Unrecoverable for that translation.
	Input(&'static str),

	/// The declared or detected encoding is not supported, or invalid bytes
	/// were encountered for the chosen encoding.
	Encoding(&'static str),

	/// The language of a unit could not be resolved (no explicit language,
	/// no archive default, no filename-extension match).
	LanguageUnset,

	/// A caller-supplied argument was invalid for the requested operation
	/// (e.g. an out-of-range unit index, a destination that is neither file,
	/// descriptor nor buffer).
	InvalidArgument(&'static str),

	/// `unparse_unit` (or any operation requiring a unit's body) was called
	/// on a [`crate::unit::Unit`] that has not yet been populated by
	/// `parse_unit` or an equivalent.
	UninitializedUnit,

	/// An XPath/XSLT transform (driven by a caller-supplied [`crate::unit::Transform`])
	/// failed. Aborts the transform but not the enclosing archive.
	Transform(String),

	/// Violation of an engine invariant. Always a fatal, unrecoverable bug.
	Internal(InternalError),

	/// I/O error while reading the source or writing the destination.
	///
	/// Not fatal by itself: callers may retry on [`std::io::ErrorKind::WouldBlock`].
	Io(IOErrorWrapper),
}

pub type Result<T> = StdResult<T, Error>;

pub(crate) trait ErrorWithContext {
	fn with_context(self, ctx: &'static str) -> Self;
}

impl Error {
	pub fn io(e: io::Error) -> Error {
		Error::Io(IOErrorWrapper::wrap(e))
	}

	/// True if this error represents a transient I/O condition
	/// (`WouldBlock`) rather than a fatal failure.
	pub fn is_would_block(&self) -> bool {
		matches!(self, Error::Io(e) if e.kind() == io::ErrorKind::WouldBlock)
	}
}

impl ErrorWithContext for Error {
	fn with_context(self, ctx: &'static str) -> Self {
		match self {
			Error::Input(_) => Error::Input(ctx),
			Error::Encoding(_) => Error::Encoding(ctx),
			other => other,
		}
	}
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Error {
		Error::io(e)
	}
}

impl From<InternalError> for Error {
	fn from(e: InternalError) -> Error {
		Error::Internal(e)
	}
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::Input(ctx) => write!(f, "input error: {}", ctx),
			Error::Encoding(ctx) => write!(f, "encoding error: {}", ctx),
			Error::LanguageUnset => f.write_str("language could not be resolved for unit"),
			Error::InvalidArgument(ctx) => write!(f, "invalid argument: {}", ctx),
			Error::UninitializedUnit => f.write_str("unit has not been parsed"),
			Error::Transform(msg) => write!(f, "transform error: {}", msg),
			Error::Internal(e) => write!(f, "internal error: {}", e),
			Error::Io(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl error::Error for Error {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match self {
			Error::Io(e) => Some(&**e),
			Error::Internal(e) => Some(e),
			_ => None,
		}
	}
}
