/*!
# Unit

Implements §3's `Unit`: a logical srcML element representing either a single
source file or a sub-unit of an [`crate::archive::Archive`]. Grounded on
`original_source/src/libsrcml/srcml_unit.cpp`/`UnitDOM.hpp` for the
metadata-resolution and parse/unparse lifecycle, and on `rxml/src/lib.rs`'s
`FeedParser`/`PullParser` composition style for how a high-level type wraps
the lower-level [`crate::translator::Translator`] rather than reimplementing
its pull loop.
*/
use std::io::{self, Write};

use crate::charbuffer::Source;
use crate::error::{Error, Result};
use crate::namespace::Namespace;
use crate::options::{ArchiveMetadata, Options, ResolvedUnitMetadata, UnitMetadata};
use crate::translator::Translator;
use crate::writer;

/// A caller-supplied XPath/XSLT (or other structural) transform, driven by
/// [`crate::archive::Archive::apply_transform`]. §1 scopes the engine itself
/// out of evaluating XPath/XSLT/RelaxNG — this trait is the seam a real
/// engine plugs into; no implementation ships in this crate.
///
/// §9 Open Question (b) (the original leaking its intermediate XSLT result
/// document) is resolved here by contract: an implementation owns the
/// lifetime of whatever intermediate result it produces and must release it
/// before `apply` returns, since this crate has no document type of its own
/// to hold such a result open.
pub trait Transform {
	/// Apply this transform to every unit of `input`, appending the results
	/// to `output`. A transform failure aborts the transform but not the
	/// caller's enclosing archive (§7): return `Err` and the caller's
	/// archive translation continues unaffected.
	fn apply(&mut self, input: &crate::archive::Archive, output: &mut crate::archive::Archive) -> std::result::Result<(), String>;
}

/// The body of a [`Unit`] once [`Unit::parse`] has populated it: resolved
/// metadata, the namespaces its body actually uses, and the rendered body
/// XML (no `<unit>` wrapper — see [`crate::translator::Translator::translate_separate`]).
#[derive(Debug, Clone)]
struct Rendered {
	resolved: ResolvedUnitMetadata,
	namespaces: Vec<Namespace>,
	body_xml: Vec<u8>,
}

/// A single logical srcML unit: one source file, or one child of an
/// [`crate::archive::Archive`]. Mirrors §6's `create-unit`/`parse-unit`/
/// `unparse-unit` operation set as inherent methods returning `Result<_,
/// Error>`, with [`crate::status::Status`] available as a pure mapping for
/// callers that want the enumerated status codes verbatim.
pub struct Unit {
	options: Options,
	metadata: UnitMetadata,
	rendered: Option<Rendered>,
}

impl Unit {
	/// `create-unit` with no metadata set yet.
	pub fn new(options: Options) -> Unit {
		Unit { options, metadata: UnitMetadata::new(), rendered: None }
	}

	/// `create-unit` with initial metadata (language, filename, directory,
	/// version, ...).
	pub fn with_metadata(options: Options, metadata: UnitMetadata) -> Unit {
		Unit { options, metadata, rendered: None }
	}

	pub fn metadata(&self) -> &UnitMetadata {
		&self.metadata
	}

	pub fn metadata_mut(&mut self) -> &mut UnitMetadata {
		&mut self.metadata
	}

	/// Resolved metadata, once [`Unit::parse`] has populated this unit.
	pub fn resolved_metadata(&self) -> Option<&ResolvedUnitMetadata> {
		self.rendered.as_ref().map(|r| &r.resolved)
	}

	/// `parse-unit`: translate `source` into this unit's body, per §4.7,
	/// optionally against an enclosing archive's metadata defaults.
	///
	/// # Errors
	///
	/// `LanguageUnset`, `Input`/`Encoding`/`Io` from the underlying
	/// [`crate::charbuffer::CharBuffer`], or `Internal` on an engine
	/// invariant violation — never a consequence of malformed source (the
	/// lexer/parser never reject input, per §7).
	pub fn parse(&mut self, source: Source, archive_default: Option<&ArchiveMetadata>) -> Result<()> {
		let translator = Translator::new(self.options);
		let mut body_xml = Vec::new();
		let (resolved, namespaces) = translator.translate_separate(source, &self.metadata, archive_default, &mut body_xml)?;
		self.rendered = Some(Rendered { resolved, namespaces, body_xml });
		Ok(())
	}

	/// Namespaces this unit's body needs, for an enclosing archive's
	/// namespace-union computation (§8 invariant 6). `None` until parsed.
	pub(crate) fn namespaces_needed(&self) -> Option<&[Namespace]> {
		self.rendered.as_ref().map(|r| r.namespaces.as_slice())
	}

	pub(crate) fn resolved(&self) -> Option<&ResolvedUnitMetadata> {
		self.rendered.as_ref().map(|r| &r.resolved)
	}

	pub(crate) fn body_xml(&self) -> Option<&[u8]> {
		self.rendered.as_ref().map(|r| r.body_xml.as_slice())
	}

	/// Assemble this unit's full, self-contained `<unit>...</unit>` XML
	/// (declaring every namespace its own body needs), independent of any
	/// enclosing archive. `Err(UninitializedUnit)` before [`Unit::parse`].
	pub fn xml(&self) -> Result<Vec<u8>> {
		let rendered = self.rendered.as_ref().ok_or(Error::UninitializedUnit)?;
		let mut out = Vec::new();
		let mut output = crate::writer::Output::new(self.options);
		output.open_unit(&mut out, &rendered.resolved, &rendered.namespaces);
		out.extend_from_slice(&rendered.body_xml);
		output.close_unit(&mut out)?;
		Ok(out)
	}

	/// `unparse-unit`: reconstruct the original source bytes from this
	/// unit's parsed XML (§8 invariant 1, property "byte preservation") and
	/// write them to `dest`.
	///
	/// # Errors
	///
	/// `UninitializedUnit` if [`Unit::parse`] has not populated this unit
	/// yet; `Io` on a write failure (the partial output is the caller's to
	/// discard, per §7).
	pub fn unparse<W: Write>(&self, dest: &mut W) -> Result<()> {
		let xml = self.xml()?;
		let xml = String::from_utf8(xml).map_err(|_| Error::Encoding("unit body is not valid UTF-8"))?;
		let src = writer::unparse(&xml);
		dest.write_all(src.as_bytes()).map_err(Error::io)
	}
}

/// Destinations `unparse-unit`/`parse-unit` may target, mirroring
/// §4.1's four source kinds for the output side (§6's operation table lists
/// "destination" alongside "file, file descriptor or buffer").
pub enum Destination<'a> {
	Writer(&'a mut dyn Write),
	Buffer(&'a mut Vec<u8>),
}

impl<'a> Write for Destination<'a> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		match self {
			Destination::Writer(w) => w.write(buf),
			Destination::Buffer(b) => {
				b.extend_from_slice(buf);
				Ok(buf.len())
			}
		}
	}

	fn flush(&mut self) -> io::Result<()> {
		match self {
			Destination::Writer(w) => w.flush(),
			Destination::Buffer(_) => Ok(()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::language::Language;

	#[test]
	fn unparse_before_parse_is_uninitialized_unit() {
		let unit = Unit::new(Options::NONE);
		let mut out = Vec::new();
		let err = unit.unparse(&mut out).unwrap_err();
		assert_eq!(err, Error::UninitializedUnit);
	}

	#[test]
	fn parse_then_unparse_round_trips_source() {
		let mut unit = Unit::with_metadata(
			Options::NONE,
			UnitMetadata { filename: Some("a.c".to_string()), ..Default::default() },
		);
		let src = "int f(int x) { return x+1; }";
		unit.parse(Source::Buffer(src.as_bytes().to_vec()), None).unwrap();
		assert_eq!(unit.resolved_metadata().unwrap().language, Some(Language::C));
		let mut out = Vec::new();
		unit.unparse(&mut out).unwrap();
		assert_eq!(String::from_utf8(out).unwrap(), src);
	}

	#[test]
	fn xml_reports_needed_namespaces_on_the_unit_itself() {
		let mut unit = Unit::with_metadata(
			Options::NONE,
			UnitMetadata { filename: Some("a.c".to_string()), ..Default::default() },
		);
		unit.parse(Source::Buffer(b"#include <a.h>\n".to_vec()), None).unwrap();
		let xml = String::from_utf8(unit.xml().unwrap()).unwrap();
		assert!(xml.contains("xmlns:cpp"));
	}

	#[test]
	fn destination_buffer_variant_collects_written_bytes() {
		let mut buf = Vec::new();
		{
			let mut dest = Destination::Buffer(&mut buf);
			dest.write_all(b"hello").unwrap();
		}
		assert_eq!(buf, b"hello");
	}
}
