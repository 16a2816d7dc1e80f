/*!
# Pluggable language grammar

Per §1's explicit scoping-out of "detailed C++/Java grammar productions", the
lexer and parser consult a [`LanguageGrammar`] trait object rather than
embedding a full grammar per language. `original_source`'s per-language
keyword handling (scattered across `srcMLUtility.cpp`/`srcMLTranslator.hpp`)
is collapsed here into four static keyword tables plus a handful of lexical
shape flags, which is all the degree of detail §4.2/§4.3 ask the grammar
collaborator to provide.
*/
use phf::{phf_set, Set};

/// What a `LanguageGrammar` tells the lexer/parser about one language's
/// surface syntax.
pub trait LanguageGrammar: Sync {
	/// True if `word` is a reserved keyword in this language (as opposed to
	/// an ordinary identifier).
	fn is_keyword(&self, word: &str) -> bool;

	/// True if `word` is specifically a type-introducing keyword (`int`,
	/// `struct`, `class`, ...), used by the parser to decide whether to open
	/// a `<type>` element.
	fn is_type_keyword(&self, word: &str) -> bool;

	/// True if `word` introduces a control-flow statement (`if`, `while`,
	/// `for`, `switch`, `return`, ...).
	fn is_control_keyword(&self, word: &str) -> bool;

	/// Whether this language recognizes C-style preprocessor directives
	/// (`#include`, `#define`, ...).
	fn has_preprocessor(&self) -> bool;

	/// Whether `//` line comments are recognized.
	fn has_line_comments(&self) -> bool;

	/// String literal quote character(s). C/C++/C#/Java all use `"`.
	fn string_quote(&self) -> char {
		'"'
	}

	/// Character literal quote character, if this language has one distinct
	/// from string literals (all four supported languages do: `'`).
	fn char_quote(&self) -> Option<char> {
		Some('\'')
	}
}

macro_rules! keyword_grammar {
	($name:ident, $keywords:expr, $types:expr, $control:expr, $preproc:expr, $line_comments:expr) => {
		pub struct $name;

		impl LanguageGrammar for $name {
			fn is_keyword(&self, word: &str) -> bool {
				$keywords.contains(word) || $types.contains(word) || $control.contains(word)
			}

			fn is_type_keyword(&self, word: &str) -> bool {
				$types.contains(word)
			}

			fn is_control_keyword(&self, word: &str) -> bool {
				$control.contains(word)
			}

			fn has_preprocessor(&self) -> bool {
				$preproc
			}

			fn has_line_comments(&self) -> bool {
				$line_comments
			}
		}
	};
}

static C_OTHER_KEYWORDS: Set<&'static str> = phf_set! {
	"auto", "const", "extern", "register", "sizeof", "static", "typedef", "volatile", "goto",
	"inline", "restrict", "_Bool", "_Complex", "_Imaginary",
};
static C_TYPE_KEYWORDS: Set<&'static str> = phf_set! {
	"void", "char", "short", "int", "long", "float", "double", "signed", "unsigned",
	"struct", "union", "enum",
};
static C_CONTROL_KEYWORDS: Set<&'static str> = phf_set! {
	"if", "else", "for", "while", "do", "switch", "case", "default", "break", "continue",
	"return", "goto",
};

keyword_grammar!(CGrammar, C_OTHER_KEYWORDS, C_TYPE_KEYWORDS, C_CONTROL_KEYWORDS, true, true);

static CPP_OTHER_KEYWORDS: Set<&'static str> = phf_set! {
	"auto", "const", "extern", "register", "sizeof", "static", "typedef", "volatile", "goto",
	"inline", "mutable", "explicit", "friend", "virtual", "public", "private", "protected",
	"namespace", "using", "template", "typename", "new", "delete", "this", "operator",
	"throw", "try", "catch", "constexpr", "noexcept", "override", "final", "decltype",
};
static CPP_TYPE_KEYWORDS: Set<&'static str> = phf_set! {
	"void", "char", "short", "int", "long", "float", "double", "signed", "unsigned", "bool",
	"wchar_t", "struct", "union", "enum", "class",
};
static CPP_CONTROL_KEYWORDS: Set<&'static str> = phf_set! {
	"if", "else", "for", "while", "do", "switch", "case", "default", "break", "continue",
	"return", "goto",
};

keyword_grammar!(CppGrammar, CPP_OTHER_KEYWORDS, CPP_TYPE_KEYWORDS, CPP_CONTROL_KEYWORDS, true, true);

static CSHARP_OTHER_KEYWORDS: Set<&'static str> = phf_set! {
	"const", "static", "readonly", "sealed", "abstract", "override", "virtual", "public",
	"private", "protected", "internal", "using", "namespace", "new", "this", "base",
	"delegate", "event", "async", "await", "yield", "partial", "params", "ref", "out",
	"var", "is", "as",
};
static CSHARP_TYPE_KEYWORDS: Set<&'static str> = phf_set! {
	"void", "char", "short", "int", "long", "float", "double", "decimal", "bool", "byte",
	"sbyte", "uint", "ulong", "ushort", "string", "object", "struct", "enum", "class",
	"interface",
};
static CSHARP_CONTROL_KEYWORDS: Set<&'static str> = phf_set! {
	"if", "else", "for", "foreach", "while", "do", "switch", "case", "default", "break",
	"continue", "return", "goto", "throw", "try", "catch", "finally",
};

keyword_grammar!(
	CSharpGrammar,
	CSHARP_OTHER_KEYWORDS,
	CSHARP_TYPE_KEYWORDS,
	CSHARP_CONTROL_KEYWORDS,
	false,
	true
);

static JAVA_OTHER_KEYWORDS: Set<&'static str> = phf_set! {
	"final", "static", "abstract", "synchronized", "native", "transient", "volatile",
	"public", "private", "protected", "package", "import", "extends", "implements", "new",
	"this", "super", "throws", "instanceof", "assert", "strictfp",
};
static JAVA_TYPE_KEYWORDS: Set<&'static str> = phf_set! {
	"void", "char", "short", "int", "long", "float", "double", "boolean", "byte", "String",
	"class", "interface", "enum",
};
static JAVA_CONTROL_KEYWORDS: Set<&'static str> = phf_set! {
	"if", "else", "for", "while", "do", "switch", "case", "default", "break", "continue",
	"return", "throw", "try", "catch", "finally",
};

keyword_grammar!(
	JavaGrammar,
	JAVA_OTHER_KEYWORDS,
	JAVA_TYPE_KEYWORDS,
	JAVA_CONTROL_KEYWORDS,
	false,
	true
);

pub static C_GRAMMAR: CGrammar = CGrammar;
pub static CPP_GRAMMAR: CppGrammar = CppGrammar;
pub static CSHARP_GRAMMAR: CSharpGrammar = CSharpGrammar;
pub static JAVA_GRAMMAR: JavaGrammar = JavaGrammar;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn c_grammar_classifies_type_vs_control_vs_other() {
		assert!(C_GRAMMAR.is_type_keyword("int"));
		assert!(C_GRAMMAR.is_control_keyword("while"));
		assert!(C_GRAMMAR.is_keyword("static"));
		assert!(!C_GRAMMAR.is_keyword("foo"));
	}

	#[test]
	fn cpp_grammar_knows_class_as_type_keyword() {
		assert!(CPP_GRAMMAR.is_type_keyword("class"));
		assert!(CPP_GRAMMAR.is_keyword("template"));
	}

	#[test]
	fn csharp_and_java_have_no_preprocessor() {
		assert!(!CSHARP_GRAMMAR.has_preprocessor());
		assert!(!JAVA_GRAMMAR.has_preprocessor());
		assert!(C_GRAMMAR.has_preprocessor());
		assert!(CPP_GRAMMAR.has_preprocessor());
	}

	#[test]
	fn java_string_is_a_type_keyword() {
		assert!(JAVA_GRAMMAR.is_type_keyword("String"));
	}
}
