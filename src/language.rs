/*!
# Supported languages and the pluggable `LanguageGrammar` collaborator

The detailed C++/Java grammar productions are explicitly out of scope (§1);
the parser consults a [`LanguageGrammar`] trait object for keyword
classification and comment/string/preprocessor lexical shapes, and
[`Language`] is the concrete enumeration of the four supported front ends.
*/
use crate::lexer::grammar::{self, LanguageGrammar};

/// One of the four supported source languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_support", derive(serde::Serialize, serde::Deserialize))]
pub enum Language {
	C,
	Cpp,
	CSharp,
	Java,
}

impl Language {
	/// Resolve a language from a filename extension, as used by §4.7's
	/// language resolution order when no explicit language was given.
	pub fn from_extension(filename: &str) -> Option<Language> {
		let ext = filename.rsplit('.').next()?.to_ascii_lowercase();
		Some(match ext.as_str() {
			"c" | "h" => Language::C,
			"cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" | "c++" | "tcc" => Language::Cpp,
			"cs" => Language::CSharp,
			"java" => Language::Java,
			_ => return None,
		})
	}

	/// The canonical attribute value srcML uses for this language in the
	/// `language="..."` unit attribute.
	pub fn as_attr_str(self) -> &'static str {
		match self {
			Language::C => "C",
			Language::Cpp => "C++",
			Language::CSharp => "C#",
			Language::Java => "Java",
		}
	}

	pub fn from_attr_str(s: &str) -> Option<Language> {
		match s {
			"C" => Some(Language::C),
			"C++" => Some(Language::Cpp),
			"C#" => Some(Language::CSharp),
			"Java" => Some(Language::Java),
			_ => None,
		}
	}

	/// The grammar collaborator for this language.
	pub fn grammar(self) -> &'static dyn LanguageGrammar {
		match self {
			Language::C => &grammar::C_GRAMMAR,
			Language::Cpp => &grammar::CPP_GRAMMAR,
			Language::CSharp => &grammar::CSHARP_GRAMMAR,
			Language::Java => &grammar::JAVA_GRAMMAR,
		}
	}

	/// Whether this language's grammar supports C-style preprocessor
	/// directives (`#include`, `#define`, ...). Only C and C++ do; C# and
	/// Java are excluded per §1's scope (pluggable grammar, not full
	/// preprocessor emulation for every language).
	pub fn has_cpp_preprocessor(self) -> bool {
		matches!(self, Language::C | Language::Cpp)
	}
}
