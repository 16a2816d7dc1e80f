/*!
# Namespace registry

An ordered mapping from URI to preferred prefix, per §3's `NamespaceRegistry`.
The eight well-known URIs of §6 are a `phf::Map` (compile-time static map,
matching [`crate::elements::ElementTable`]'s construction); any URI outside
that set is tracked in a small runtime overflow table, e.g. for an
`apply-transform` extension namespace.
*/
use phf::phf_map;

/// One of the fixed, well-known srcML namespaces, or a caller-registered
/// extension namespace tracked by [`NamespaceRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
	/// The default (unprefixed) srcML source namespace.
	Src,
	Cpp,
	Err,
	Literal,
	Operator,
	Modifier,
	Position,
	Diff,
}

impl Namespace {
	pub fn uri(self) -> &'static str {
		match self {
			Namespace::Src => "http://www.srcML.org/srcML/src",
			Namespace::Cpp => "http://www.srcML.org/srcML/cpp",
			Namespace::Err => "http://www.srcML.org/srcML/srcerr",
			Namespace::Literal => "http://www.srcML.org/srcML/literal",
			Namespace::Operator => "http://www.srcML.org/srcML/operator",
			Namespace::Modifier => "http://www.srcML.org/srcML/modifier",
			Namespace::Position => "http://www.srcML.org/srcML/position",
			Namespace::Diff => "http://www.srcML.org/srcML/diff",
		}
	}

	/// The preferred prefix for this namespace. `None` for the default
	/// (unprefixed) namespace.
	pub fn prefix(self) -> Option<&'static str> {
		match self {
			Namespace::Src => None,
			Namespace::Cpp => Some("cpp"),
			Namespace::Err => Some("err"),
			Namespace::Literal => Some("lit"),
			Namespace::Operator => Some("op"),
			Namespace::Modifier => Some("type"),
			Namespace::Position => Some("pos"),
			Namespace::Diff => Some("diff"),
		}
	}

	pub fn all() -> &'static [Namespace] {
		&[
			Namespace::Src,
			Namespace::Cpp,
			Namespace::Err,
			Namespace::Literal,
			Namespace::Operator,
			Namespace::Modifier,
			Namespace::Position,
			Namespace::Diff,
		]
	}
}

static PREFIX_BY_URI: phf::Map<&'static str, &'static str> = phf_map! {
	"http://www.srcML.org/srcML/src" => "",
	"http://www.srcML.org/srcML/cpp" => "cpp",
	"http://www.srcML.org/srcML/srcerr" => "err",
	"http://www.srcML.org/srcML/literal" => "lit",
	"http://www.srcML.org/srcML/operator" => "op",
	"http://www.srcML.org/srcML/modifier" => "type",
	"http://www.srcML.org/srcML/position" => "pos",
	"http://www.srcML.org/srcML/diff" => "diff",
};

/// Runtime registry of namespace declarations in effect for a translation.
///
/// The eight well-known URIs resolve for free via [`PREFIX_BY_URI`]; any
/// other URI registered with [`NamespaceRegistry::register`] is assigned a
/// generated prefix (`ns0`, `ns1`, ...), mirroring §3's "any URI not in the
/// [well-known] set receives a generated prefix".
#[derive(Debug, Clone, Default)]
pub struct NamespaceRegistry {
	overflow: Vec<(String, String)>,
}

impl NamespaceRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Look up the prefix for a URI, registering it with a generated prefix
	/// if it is not already known.
	pub fn prefix_for(&mut self, uri: &str) -> String {
		if let Some(p) = PREFIX_BY_URI.get(uri) {
			return p.to_string();
		}
		if let Some((_, p)) = self.overflow.iter().find(|(u, _)| u == uri) {
			return p.clone();
		}
		let generated = format!("ns{}", self.overflow.len());
		self.overflow.push((uri.to_string(), generated.clone()));
		generated
	}

	/// Register a caller-supplied extension namespace URI, returning its
	/// generated prefix without requiring a subsequent lookup.
	pub fn register(&mut self, uri: &str) -> String {
		self.prefix_for(uri)
	}

	/// Well-known prefix for one of the fixed URIs, without mutating the
	/// overflow table (used internally when emitting declarations that are
	/// known in advance, e.g. the default src/cpp namespaces).
	pub fn well_known_prefix(uri: &str) -> Option<&'static str> {
		PREFIX_BY_URI.get(uri).copied()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn well_known_uris_have_fixed_prefixes() {
		assert_eq!(Namespace::Src.prefix(), None);
		assert_eq!(Namespace::Cpp.prefix(), Some("cpp"));
		assert_eq!(Namespace::Diff.prefix(), Some("diff"));
	}

	#[test]
	fn registry_resolves_well_known_uri_without_overflow() {
		let mut reg = NamespaceRegistry::new();
		assert_eq!(reg.prefix_for(Namespace::Cpp.uri()), "cpp");
		assert!(reg.overflow.is_empty());
	}

	#[test]
	fn registry_generates_prefix_for_unknown_uri() {
		let mut reg = NamespaceRegistry::new();
		let p1 = reg.prefix_for("urn:example:one");
		let p2 = reg.prefix_for("urn:example:two");
		let p1_again = reg.prefix_for("urn:example:one");
		assert_ne!(p1, p2);
		assert_eq!(p1, p1_again);
	}
}
