/*!
# Translation options and metadata

`Options` is a hand-rolled bitmask following `original_source`'s `OPTION_TYPE`
convention rather than pulling in the `bitflags` crate for a dozen constants.
`UnitMetadata`/`ArchiveMetadata` carry the per-unit/per-archive attributes of
§6 (`language`, `filename`, `directory`, `version`, `timestamp`, `hash`,
`revision`, `tabs`).
*/
#[cfg(feature = "serde_support")]
use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Bitmask of translation options, mirroring §6's enumerated option flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct Options(u32);

impl Options {
	pub const NONE: Options = Options(0);
	pub const CPP: Options = Options(1 << 0);
	pub const CPP_NOMACRO: Options = Options(1 << 1);
	pub const XML_DECL: Options = Options(1 << 2);
	pub const NAMESPACE_DECL: Options = Options(1 << 3);
	pub const COMPRESSED: Options = Options(1 << 4);
	pub const POSITION: Options = Options(1 << 5);
	pub const TABS: Options = Options(1 << 6);
	pub const HASH: Options = Options(1 << 7);
	pub const APPLY_ROOT: Options = Options(1 << 8);
	pub const XSLT_ALL: Options = Options(1 << 9);
	pub const XPATH_TOTAL: Options = Options(1 << 10);
	pub const TERMINATE: Options = Options(1 << 11);
	pub const QUIET: Options = Options(1 << 12);
	pub const VERBOSE: Options = Options(1 << 13);
	pub const NULL_SEPARATOR: Options = Options(1 << 14);
	pub const DIFF: Options = Options(1 << 15);

	pub const fn empty() -> Options {
		Options::NONE
	}

	pub const fn contains(self, other: Options) -> bool {
		(self.0 & other.0) == other.0
	}

	pub const fn union(self, other: Options) -> Options {
		Options(self.0 | other.0)
	}

	pub const fn remove(self, other: Options) -> Options {
		Options(self.0 & !other.0)
	}
}

impl std::ops::BitOr for Options {
	type Output = Options;

	fn bitor(self, rhs: Options) -> Options {
		self.union(rhs)
	}
}

impl std::ops::BitOrAssign for Options {
	fn bitor_assign(&mut self, rhs: Options) {
		*self = self.union(rhs);
	}
}

/// Per-unit metadata attributes (§6).
///
/// Any field left `None` falls back to the enclosing archive's default, and
/// then to absent, per §4.7's metadata resolution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct UnitMetadata {
	pub language: Option<Language>,
	pub filename: Option<String>,
	pub directory: Option<String>,
	pub version: Option<String>,
	pub timestamp: Option<String>,
	pub hash: Option<String>,
	pub revision: Option<String>,
	pub tabs: Option<u8>,
}

impl UnitMetadata {
	pub fn new() -> Self {
		Self::default()
	}

	/// Resolve this unit's metadata against an archive default, per the
	/// "per-unit override -> archive default -> absent" order of §4.7.
	pub fn resolved_against(&self, archive_default: &ArchiveMetadata) -> ResolvedUnitMetadata {
		ResolvedUnitMetadata {
			language: self.language.or(archive_default.language),
			filename: self.filename.clone(),
			directory: self.directory.clone().or_else(|| archive_default.directory.clone()),
			version: self.version.clone().or_else(|| archive_default.version.clone()),
			timestamp: self.timestamp.clone(),
			hash: self.hash.clone(),
			revision: self.revision.clone().or_else(|| archive_default.revision.clone()),
			tabs: self.tabs.unwrap_or(archive_default.tabs),
		}
	}
}

/// Archive-wide defaults applied to every child unit unless overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct ArchiveMetadata {
	pub language: Option<Language>,
	pub directory: Option<String>,
	pub version: Option<String>,
	pub revision: Option<String>,
	pub tabs: u8,
}

impl Default for ArchiveMetadata {
	fn default() -> Self {
		ArchiveMetadata {
			language: None,
			directory: None,
			version: None,
			revision: None,
			tabs: 8,
		}
	}
}

/// Fully-resolved metadata for a single unit, ready to hand to [`crate::writer::Output`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUnitMetadata {
	pub language: Option<Language>,
	pub filename: Option<String>,
	pub directory: Option<String>,
	pub version: Option<String>,
	pub timestamp: Option<String>,
	pub hash: Option<String>,
	pub revision: Option<String>,
	pub tabs: u8,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn options_union_and_contains() {
		let o = Options::CPP | Options::XML_DECL;
		assert!(o.contains(Options::CPP));
		assert!(o.contains(Options::XML_DECL));
		assert!(!o.contains(Options::POSITION));
	}

	#[test]
	fn unit_metadata_falls_back_to_archive_default() {
		let archive = ArchiveMetadata {
			language: Some(Language::C),
			directory: Some("src".to_string()),
			version: None,
			revision: None,
			tabs: 4,
		};
		let unit = UnitMetadata {
			filename: Some("a.c".to_string()),
			..Default::default()
		};
		let resolved = unit.resolved_against(&archive);
		assert_eq!(resolved.language, Some(Language::C));
		assert_eq!(resolved.directory.as_deref(), Some("src"));
		assert_eq!(resolved.tabs, 4);
		assert_eq!(resolved.filename.as_deref(), Some("a.c"));
	}

	#[test]
	fn unit_override_wins_over_archive_default() {
		let archive = ArchiveMetadata {
			language: Some(Language::C),
			..Default::default()
		};
		let unit = UnitMetadata {
			language: Some(Language::Cpp),
			..Default::default()
		};
		assert_eq!(unit.resolved_against(&archive).language, Some(Language::Cpp));
	}
}
