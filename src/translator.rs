/*!
# Translator

Implements §4.7: the orchestrator that wires [`crate::charbuffer::CharBuffer`]
to a [`crate::lexer::TokenLexer`] and [`crate::parser::StreamParser`], and
hands the resulting token stream to [`crate::writer::Output`]. This is the
piece `original_source/src/translator/srcMLTranslator.hpp` and
`srcMLTranslatorCore.hpp` call the translator core; [`rxml::FeedParser`]/
[`rxml::PullParser`] (`rxml/src/lib.rs`) are the shape this module's
`translate`/`translate_separate` split is grounded on — a thin, composing
frontend over the lower-level pull pieces, not a new parsing algorithm of its
own.

Two entry points mirror §4.7:
- [`Translator::translate`] drives one complete, self-contained `<unit>`
  document (XML declaration, opening tag with every namespace its body
  needs, body, closing tag) into a caller-supplied buffer.
- [`Translator::translate_separate`] drives only a unit's *body* (no
  `<unit>` wrapper, no XML declaration) into a caller-supplied buffer,
  returning the resolved metadata and the namespaces that body needs — the
  primitive [`crate::archive::Archive`] uses to assemble many units under one
  root with a namespace *union*, per §3's `Archive` invariants.
*/
use bytes::BufMut;

use crate::charbuffer::{self, CharBuffer, Source};
use crate::elements::ElementTable;
use crate::error::{Error, Result};
use crate::language::Language;
use crate::lexer::TokenLexer;
use crate::namespace::Namespace;
use crate::options::{ArchiveMetadata, Options, ResolvedUnitMetadata, UnitMetadata};
use crate::parser::StreamParser;
use crate::token::Token;
use crate::writer::Output;

/// Resolve a unit's language per §4.7's order: explicit unit language ->
/// archive default language -> filename-extension lookup -> `LanguageUnset`.
fn resolve_language(
	unit_meta: &UnitMetadata,
	archive_default: Option<&ArchiveMetadata>,
	filename_hint: Option<&str>,
) -> Result<Language> {
	if let Some(lang) = unit_meta.language {
		return Ok(lang);
	}
	if let Some(lang) = archive_default.and_then(|a| a.language) {
		return Ok(lang);
	}
	if let Some(name) = filename_hint.or(unit_meta.filename.as_deref()) {
		if let Some(lang) = Language::from_extension(name) {
			return Ok(lang);
		}
	}
	Err(Error::LanguageUnset)
}

/// The namespaces a rendered body actually needs, in [`Namespace::all`]'s
/// fixed order. The default (src) namespace is always included: every unit
/// is itself a `<unit>` element in that namespace regardless of what its
/// body contains.
fn namespaces_used(body: &[Token]) -> Vec<Namespace> {
	let mut needed = vec![Namespace::Src];
	for tok in body {
		if tok.is_markup() {
			if let Some(info) = ElementTable::try_lookup(tok.ty) {
				if !needed.contains(&info.ns) {
					needed.push(info.ns);
				}
			}
		}
	}
	Namespace::all().iter().copied().filter(|ns| needed.contains(ns)).collect()
}

/// Orchestrates one unit's translation, per §4.7. Stateless beyond the
/// [`Options`] it was configured with: a caller parallelizing translation of
/// many files does so with one `Translator` per thread (§5), since nothing
/// here is shared mutable state beyond the process-wide
/// [`crate::elements::ElementTable`]/[`crate::namespace::NamespaceRegistry`]
/// singletons.
pub struct Translator {
	options: Options,
}

impl Translator {
	pub fn new(options: Options) -> Translator {
		Translator { options }
	}

	pub fn options(&self) -> Options {
		self.options
	}

	/// Drive one complete, self-contained unit (XML declaration + `<unit>`
	/// wrapper declaring every namespace its own body needs + body +
	/// closing tag) into `out`. This is the single-unit (non-archive) mode
	/// of §6.
	#[tracing::instrument(level = "debug", skip(self, source, out), fields(filename = unit_meta.filename.as_deref()))]
	pub fn translate<O: BufMut>(&self, source: Source, unit_meta: &UnitMetadata, out: &mut O) -> Result<ResolvedUnitMetadata> {
		let mut body = Vec::new();
		let (resolved, namespaces) = self.translate_separate(source, unit_meta, None, &mut body)?;
		let mut output = Output::new(self.options);
		output.write_xml_declaration(out);
		output.open_unit(out, &resolved, &namespaces);
		out.put_slice(&body);
		output.close_unit(out)?;
		tracing::debug!(language = ?resolved.language, bytes = body.len(), "unit translated");
		Ok(resolved)
	}

	/// Drive a single unit's *body* (no `<unit>` wrapper) into `out`,
	/// returning its resolved metadata and the namespaces that body needs.
	/// `archive_default` supplies the enclosing archive's metadata defaults
	/// (§4.7's "archive default" resolution tier) when this unit is a child
	/// of an [`crate::archive::Archive`]; `None` for a standalone unit.
	#[tracing::instrument(level = "debug", skip(self, source, archive_default, out), fields(filename = unit_meta.filename.as_deref()))]
	pub fn translate_separate<O: BufMut>(
		&self,
		source: Source,
		unit_meta: &UnitMetadata,
		archive_default: Option<&ArchiveMetadata>,
		out: &mut O,
	) -> Result<(ResolvedUnitMetadata, Vec<Namespace>)> {
		let filename_hint = source.filename_hint();
		let language = resolve_language(unit_meta, archive_default, filename_hint).map_err(|e| {
			tracing::warn!(filename = filename_hint.or(unit_meta.filename.as_deref()), "could not resolve a language for this unit");
			e
		})?;

		let default_archive_meta;
		let archive_meta = match archive_default {
			Some(a) => a,
			None => {
				default_archive_meta = ArchiveMetadata::default();
				&default_archive_meta
			}
		};
		let mut resolved = unit_meta.resolved_against(archive_meta);
		resolved.language = Some(language);
		if resolved.filename.is_none() {
			if let Some(name) = filename_hint {
				resolved.filename = Some(name.to_string());
			}
		}

		let hash_slot = if self.options.contains(Options::HASH) { Some(charbuffer::new_hash_slot()) } else { None };
		let body = {
			let mut chars = CharBuffer::from_source(source, None, hash_slot.clone())?;
			let lexer = TokenLexer::new(&mut chars, language);
			let mut parser = StreamParser::new(lexer, language);
			let mut tokens = Vec::new();
			while let Some(tok) = parser.next()? {
				tokens.push(tok);
			}
			tokens
			// `chars` (and with it the lexer/parser borrowing it) drops here,
			// finalizing the SHA-1 hash into `hash_slot` before we read it.
		};
		if let Some(slot) = hash_slot {
			resolved.hash = slot.borrow().clone();
		}

		let namespaces = namespaces_used(&body);
		let mut output = Output::new(self.options);
		for tok in &body {
			output.write_token(out, tok)?;
		}
		Ok((resolved, namespaces))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn meta(filename: &str) -> UnitMetadata {
		UnitMetadata { filename: Some(filename.to_string()), ..Default::default() }
	}

	#[test]
	fn translate_wraps_body_in_unit_with_needed_namespaces() {
		// XML_DECL suppresses the leading declaration so the assertions below
		// can check the unit element itself without it.
		let t = Translator::new(Options::XML_DECL);
		let mut out = Vec::new();
		let resolved = t.translate(Source::Buffer(b"int x;".to_vec()), &meta("a.c"), &mut out).unwrap();
		assert_eq!(resolved.language, Some(Language::C));
		let s = String::from_utf8(out).unwrap();
		assert!(s.starts_with("<unit xmlns=\"http://www.srcML.org/srcML/src\""));
		assert!(s.ends_with("</unit>"));
		assert!(s.contains("<decl_stmt>"));
	}

	#[test]
	fn xml_declaration_is_emitted_by_default_and_suppressed_by_the_flag() {
		let t = Translator::new(Options::NONE);
		let mut out = Vec::new();
		t.translate(Source::Buffer(b"int x;".to_vec()), &meta("a.c"), &mut out).unwrap();
		assert!(String::from_utf8(out).unwrap().starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<unit"));

		let t = Translator::new(Options::XML_DECL);
		let mut out = Vec::new();
		t.translate(Source::Buffer(b"int x;".to_vec()), &meta("a.c"), &mut out).unwrap();
		assert!(String::from_utf8(out).unwrap().starts_with("<unit"));
	}

	#[test]
	fn translate_declares_cpp_namespace_only_when_needed() {
		let t = Translator::new(Options::XML_DECL);
		let mut out = Vec::new();
		t.translate(Source::Buffer(b"#include <a.h>\nint x;".to_vec()), &meta("a.c"), &mut out).unwrap();
		let s = String::from_utf8(out).unwrap();
		assert!(s.contains("xmlns:cpp=\"http://www.srcML.org/srcML/cpp\""));

		let mut out2 = Vec::new();
		t.translate(Source::Buffer(b"int x;".to_vec()), &meta("a.c"), &mut out2).unwrap();
		let s2 = String::from_utf8(out2).unwrap();
		assert!(!s2.contains("xmlns:cpp"));
	}

	#[test]
	fn unresolved_language_is_an_error() {
		let t = Translator::new(Options::NONE);
		let mut out = Vec::new();
		let err = t.translate(Source::Buffer(b"int x;".to_vec()), &UnitMetadata::default(), &mut out).unwrap_err();
		assert_eq!(err, Error::LanguageUnset);
	}

	#[test]
	fn archive_default_language_is_used_when_unit_has_none() {
		let t = Translator::new(Options::NONE);
		let archive_default = ArchiveMetadata { language: Some(Language::Cpp), ..Default::default() };
		let mut out = Vec::new();
		let (resolved, _) = t
			.translate_separate(Source::Buffer(b"int x;".to_vec()), &UnitMetadata::default(), Some(&archive_default), &mut out)
			.unwrap();
		assert_eq!(resolved.language, Some(Language::Cpp));
	}

	#[test]
	fn hash_option_populates_resolved_metadata() {
		let t = Translator::new(Options::HASH);
		let mut out = Vec::new();
		let resolved = t.translate(Source::Buffer(b"int x;".to_vec()), &meta("a.c"), &mut out).unwrap();
		assert_eq!(resolved.hash.as_deref().map(|h| h.len()), Some(40));
	}

	#[test]
	fn byte_preservation_round_trips_through_unparse() {
		let t = Translator::new(Options::NONE);
		let mut out = Vec::new();
		let src = "int f(int x) { return x+1; }";
		t.translate(Source::Buffer(src.as_bytes().to_vec()), &meta("a.c"), &mut out).unwrap();
		let xml = String::from_utf8(out).unwrap();
		assert_eq!(crate::writer::unparse(&xml), src);
	}
}
