/*!
# srcml-core

A streaming translation engine between source code (C, C++, C#, Java) and
srcML, the XML format in which every lexical token of the input is preserved
but syntactic structures — functions, classes, statements, expressions,
preprocessor directives, comments — are wrapped in named elements.

## Features

* Streaming, single-threaded, pull-driven translation: no background
  threads, no implicit buffering of the whole input
* Byte-preserving: `unparse(parse(s)) == s` for any source `s` (§8 invariant 1)
* Encoding detection (BOM sniffing, heuristic fallback to ISO-8859-1),
  CRLF normalization, optional SHA-1 content hashing
* Archive assembly: many [`Unit`]s under one [`Archive`] root with a
  namespace union, rather than each child repeating every declaration
* A pluggable [`lexer::grammar::LanguageGrammar`] per supported language; the
  detailed C++/Java grammar productions are intentionally not this crate's
  concern (see `SPEC_FULL.md` §1)

## Example

```
use srcml_core::{Options, Translator, UnitMetadata, charbuffer::Source};

let translator = Translator::new(Options::NONE);
let mut out = Vec::new();
let meta = UnitMetadata { filename: Some("a.c".to_string()), ..Default::default() };
let resolved = translator
    .translate(Source::Buffer(b"int f(int x) { return x+1; }".to_vec()), &meta, &mut out)
    .unwrap();
assert_eq!(resolved.language, Some(srcml_core::Language::C));
assert!(String::from_utf8(out).unwrap().contains("<function>"));
```

## Archive usage

```
use srcml_core::{Archive, ArchiveMetadata, Options, UnitMetadata, charbuffer::Source};

let mut archive = Archive::create(Options::NONE, ArchiveMetadata::default());
let a = archive.create_unit(UnitMetadata { filename: Some("a.c".into()), ..Default::default() });
archive.parse_unit(a, Source::Buffer(b"int a;".to_vec())).unwrap();
let mut out = Vec::new();
archive.write(&mut out).unwrap();
```

## Async usage

With the `async` feature, [`future::AsyncTranslator`] drives a translation
from an [`tokio::io::AsyncRead`] source without blocking the calling task —
see its docs for why this crate's otherwise-synchronous core (§5: "no
background threads inside the engine; I/O is blocking and synchronous") can
still be driven from async code.
*/
pub mod archive;
pub mod charbuffer;
pub mod elements;
pub mod error;
pub mod language;
pub mod lexer;
pub mod mode;
pub mod modestack;
pub mod namespace;
pub mod options;
pub mod parser;
pub mod status;
pub mod token;
pub mod tokenbuffer;
pub mod translator;
pub mod unit;
pub mod writer;

#[cfg(feature = "async")]
pub mod future;


#[doc(inline)]
pub use archive::Archive;
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use language::Language;
#[doc(inline)]
pub use options::{ArchiveMetadata, Options, ResolvedUnitMetadata, UnitMetadata};
#[doc(inline)]
pub use status::Status;
#[doc(inline)]
pub use token::{Category, Token};
#[doc(inline)]
pub use translator::Translator;
#[doc(inline)]
pub use unit::{Destination, Transform, Unit};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
