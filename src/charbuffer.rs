/*!
# CharBuffer

Byte-source abstraction implementing §4.1: encoding detection, BOM stripping,
CR/LF normalization and optional content hashing, behind a single pull
operation ([`CharBuffer::next_char`]).

Grounded on `original_source/src/translator/UTF8CharBuffer.cpp` (`getChar`,
the `lastcr` flag, SHA-1 over raw bytes) for semantics, and on
`rxml/src/bufq.rs`/`rxml/src/lexer/read.rs` for the chunked, `io::Read`-driven
buffering shape (read a fixed-size chunk, decode it, queue the resulting
`char`s, refill on exhaustion).
*/
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::rc::Rc;

use encoding_rs::{Decoder, Encoding};
use sha1::{Digest, Sha1};

use crate::error::{Error, Result};
use crate::token::Position;

#[cfg(unix)]
use std::os::unix::io::{FromRawFd, RawFd};

const CHUNK_SIZE: usize = 8192;
const DEFAULT_TAB_SIZE: u8 = 8;

/// Shared slot a caller can pass to [`CharBuffer::from_filename`] (etc.) to
/// receive the finalized content hash once the buffer is dropped, mirroring
/// `UTF8CharBuffer`'s `boost::optional<std::string> * hash` output parameter.
pub type HashSlot = Rc<RefCell<Option<String>>>;

pub fn new_hash_slot() -> HashSlot {
	Rc::new(RefCell::new(None))
}

/// One of §4.1's four construction sources, named rather than overloaded so
/// [`crate::translator::Translator`]/[`crate::unit::Unit`] can accept "a
/// source" as a single value instead of four constructor methods.
pub enum Source {
	Filename(String),
	Buffer(Vec<u8>),
	File(File),
	#[cfg(unix)]
	Fd(RawFd),
}

impl Source {
	/// Best-effort filename for language resolution by extension (§4.7): the
	/// path for [`Source::Filename`], absent for the other three kinds (a
	/// caller using `Buffer`/`File`/`Fd` must supply `UnitMetadata::filename`
	/// explicitly if it wants extension-based language resolution).
	pub fn filename_hint(&self) -> Option<&str> {
		match self {
			Source::Filename(p) => Some(p.as_str()),
			_ => None,
		}
	}
}

/// Streaming decoder over one of §4.1's four construction sources, producing
/// a logical character stream with BOM stripped, CRLF normalized to `\n`, and
/// (optionally) a running SHA-1 over the raw pre-decode bytes.
pub struct CharBuffer {
	reader: Box<dyn Read>,
	decoder: Decoder,
	chunk: Box<[u8; CHUNK_SIZE]>,
	pending: VecDeque<char>,
	reader_eof: bool,
	decoder_done: bool,
	hasher: Option<Sha1>,
	hash_slot: Option<HashSlot>,
	lastcr: bool,
	line: u32,
	column: u32,
	tab_size: u8,
	encoding: &'static Encoding,
}

impl CharBuffer {
	/// Open a source file by path.
	pub fn from_filename(path: &str, encoding: Option<&'static Encoding>, hash_slot: Option<HashSlot>) -> Result<CharBuffer> {
		let file = File::open(path).map_err(|_| Error::Input("could not open source file"))?;
		Self::from_reader(Box::new(file), encoding, hash_slot)
	}

	/// Wrap an in-memory byte buffer.
	pub fn from_buffer(buf: Vec<u8>, encoding: Option<&'static Encoding>, hash_slot: Option<HashSlot>) -> Result<CharBuffer> {
		Self::from_reader(Box::new(std::io::Cursor::new(buf)), encoding, hash_slot)
	}

	/// Wrap an already-opened file handle.
	pub fn from_file(file: File, encoding: Option<&'static Encoding>, hash_slot: Option<HashSlot>) -> Result<CharBuffer> {
		Self::from_reader(Box::new(file), encoding, hash_slot)
	}

	/// Wrap an already-opened file descriptor, taking ownership of it.
	#[cfg(unix)]
	pub fn from_fd(fd: RawFd, encoding: Option<&'static Encoding>, hash_slot: Option<HashSlot>) -> Result<CharBuffer> {
		let file = unsafe { File::from_raw_fd(fd) };
		Self::from_reader(Box::new(file), encoding, hash_slot)
	}

	/// Open one of §4.1's four construction sources by value.
	pub fn from_source(source: Source, encoding: Option<&'static Encoding>, hash_slot: Option<HashSlot>) -> Result<CharBuffer> {
		match source {
			Source::Filename(path) => Self::from_filename(&path, encoding, hash_slot),
			Source::Buffer(buf) => Self::from_buffer(buf, encoding, hash_slot),
			Source::File(file) => Self::from_file(file, encoding, hash_slot),
			#[cfg(unix)]
			Source::Fd(fd) => Self::from_fd(fd, encoding, hash_slot),
		}
	}

	fn from_reader(mut reader: Box<dyn Read>, encoding: Option<&'static Encoding>, hash_slot: Option<HashSlot>) -> Result<CharBuffer> {
		let mut hasher = hash_slot.as_ref().map(|_| Sha1::new());

		let mut sniff = [0u8; 4];
		let mut sniff_len = 0;
		while sniff_len < sniff.len() {
			match reader.read(&mut sniff[sniff_len..]) {
				Ok(0) => break,
				Ok(n) => sniff_len += n,
				Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
				Err(e) => return Err(Error::io(e)),
			}
		}
		if let Some(h) = hasher.as_mut() {
			h.update(&sniff[..sniff_len]);
		}

		let (resolved, bom_len) = match encoding {
			Some(e) => (e, 0),
			None => Self::detect_encoding(&sniff[..sniff_len]),
		};

		let mut buf = CharBuffer {
			reader,
			decoder: resolved.new_decoder_without_bom_handling(),
			chunk: Box::new([0u8; CHUNK_SIZE]),
			pending: VecDeque::new(),
			reader_eof: false,
			decoder_done: false,
			hasher,
			hash_slot,
			lastcr: false,
			line: 1,
			column: 1,
			tab_size: DEFAULT_TAB_SIZE,
			encoding: resolved,
		};
		buf.decode_chunk(&sniff[bom_len..sniff_len], false);
		Ok(buf)
	}

	/// BOM sniffing (UTF-8, UTF-16 LE/BE) followed by a crude UTF-8
	/// validity heuristic, falling back to ISO-8859-1 per §4.1. `encoding_rs`
	/// has no distinct ISO-8859-1 table (the Encoding Standard maps that
	/// label to windows-1252), so `WINDOWS_1252` stands in for it — it is
	/// byte-identical to ISO-8859-1 for the C0/C1 and Latin-1 ranges that
	/// matter for srcML's escape handling.
	fn detect_encoding(sniff: &[u8]) -> (&'static Encoding, usize) {
		if sniff.starts_with(&[0xEF, 0xBB, 0xBF]) {
			return (encoding_rs::UTF_8, 3);
		}
		if sniff.starts_with(&[0xFF, 0xFE]) {
			return (encoding_rs::UTF_16LE, 2);
		}
		if sniff.starts_with(&[0xFE, 0xFF]) {
			return (encoding_rs::UTF_16BE, 2);
		}
		if std::str::from_utf8(sniff).is_ok() {
			return (encoding_rs::UTF_8, 0);
		}
		(encoding_rs::WINDOWS_1252, 0)
	}

	pub fn encoding(&self) -> &'static Encoding {
		self.encoding
	}

	pub fn set_tab_size(&mut self, tab_size: u8) {
		self.tab_size = tab_size.max(1);
	}

	pub fn position(&self) -> Position {
		Position::new(self.line, self.column)
	}

	fn decode_chunk(&mut self, raw: &[u8], last: bool) {
		let mut out = String::with_capacity(raw.len() + 4);
		let (_, _, _had_errors) = self.decoder.decode_to_string(raw, &mut out, last);
		self.pending.extend(out.chars());
		if last {
			self.decoder_done = true;
		}
	}

	/// Pull the next decoded character with no CRLF normalization applied,
	/// refilling from the underlying reader and decoder as needed.
	fn raw_next_char(&mut self) -> Result<Option<char>> {
		loop {
			if let Some(c) = self.pending.pop_front() {
				return Ok(Some(c));
			}
			if self.decoder_done {
				return Ok(None);
			}
			if self.reader_eof {
				self.decode_chunk(&[], true);
				continue;
			}
			match self.reader.read(chunk_slice(&mut self.chunk)) {
				Ok(0) => {
					self.reader_eof = true;
				}
				Ok(n) => {
					if let Some(h) = self.hasher.as_mut() {
						h.update(&self.chunk[..n]);
					}
					let chunk = self.chunk[..n].to_vec();
					self.decode_chunk(&chunk, false);
				}
				Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
				Err(e) => return Err(Error::io(e)),
			}
		}
	}

	/// Read the next logical character: decoded, BOM-free, with any
	/// `\r\n`/lone `\r` delivered as a single `\n` (§4.1, §9 Open Question
	/// (a)). The substitution is deterministic regardless of buffer refill
	/// boundaries because `lastcr` is struct state, not a function of the
	/// current chunk.
	pub fn next_char(&mut self) -> Result<Option<char>> {
		let c = match self.raw_next_char()? {
			None => return Ok(None),
			Some(c) => c,
		};
		if self.lastcr {
			self.lastcr = false;
			if c == '\n' {
				return self.next_char();
			}
		}
		let delivered = if c == '\r' {
			self.lastcr = true;
			'\n'
		} else {
			c
		};
		self.advance_position(delivered);
		Ok(Some(delivered))
	}

	fn advance_position(&mut self, c: char) {
		match c {
			'\n' => {
				self.line += 1;
				self.column = 1;
			}
			'\t' => {
				let ts = self.tab_size as u32;
				self.column = ((self.column - 1) / ts + 1) * ts + 1;
			}
			_ => {
				self.column += 1;
			}
		}
	}
}

/// Work around `encoding_rs`/`io::Read` wanting a plain `&mut [u8]` while we
/// hold the chunk buffer boxed (to keep `CharBuffer` itself cheap to move).
fn chunk_slice(chunk: &mut [u8; CHUNK_SIZE]) -> &mut [u8] {
	&mut chunk[..]
}

impl Drop for CharBuffer {
	fn drop(&mut self) {
		if let (Some(hasher), Some(slot)) = (self.hasher.take(), self.hash_slot.take()) {
			let digest = hasher.finalize();
			let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
			*slot.borrow_mut() = Some(hex);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn collect(buf: &mut CharBuffer) -> String {
		let mut s = String::new();
		while let Some(c) = buf.next_char().unwrap() {
			s.push(c);
		}
		s
	}

	#[test]
	fn plain_ascii_round_trips() {
		let mut buf = CharBuffer::from_buffer(b"int x;".to_vec(), None, None).unwrap();
		assert_eq!(collect(&mut buf), "int x;");
	}

	#[test]
	fn crlf_normalizes_to_lf() {
		let mut buf = CharBuffer::from_buffer(b"A\r\nB\r\n".to_vec(), None, None).unwrap();
		assert_eq!(collect(&mut buf), "A\nB\n");
	}

	#[test]
	fn lone_cr_normalizes_to_lf() {
		let mut buf = CharBuffer::from_buffer(b"A\rB".to_vec(), None, None).unwrap();
		assert_eq!(collect(&mut buf), "A\nB");
	}

	#[test]
	fn utf8_bom_is_stripped() {
		let mut data = vec![0xEF, 0xBB, 0xBF];
		data.extend_from_slice("// hi".as_bytes());
		let mut buf = CharBuffer::from_buffer(data, None, None).unwrap();
		assert_eq!(collect(&mut buf), "// hi");
	}

	#[test]
	fn utf8_multibyte_survives_bom_strip() {
		let mut data = vec![0xEF, 0xBB, 0xBF];
		data.extend_from_slice("// π".as_bytes());
		let mut buf = CharBuffer::from_buffer(data, None, None).unwrap();
		assert_eq!(collect(&mut buf), "// π");
	}

	#[test]
	fn hash_is_computed_over_raw_pre_decode_bytes() {
		let slot = new_hash_slot();
		{
			let mut buf = CharBuffer::from_buffer(b"A\r\nB\r\n".to_vec(), None, Some(slot.clone())).unwrap();
			collect(&mut buf);
		}
		let mut expected_hasher = Sha1::new();
		expected_hasher.update(b"A\r\nB\r\n");
		let expected: String = expected_hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect();
		assert_eq!(slot.borrow().as_deref(), Some(expected.as_str()));
		assert_eq!(expected.len(), 40);
	}

	#[test]
	fn no_hash_slot_means_no_hashing_overhead_and_no_panic() {
		let mut buf = CharBuffer::from_buffer(b"x".to_vec(), None, None).unwrap();
		assert_eq!(collect(&mut buf), "x");
	}

	#[test]
	fn tab_advances_column_to_next_stop() {
		let mut buf = CharBuffer::from_buffer(b"a\tb".to_vec(), None, None).unwrap();
		assert_eq!(buf.next_char().unwrap(), Some('a'));
		assert_eq!(buf.position().column, 2);
		assert_eq!(buf.next_char().unwrap(), Some('\t'));
		assert_eq!(buf.position().column, 9);
	}

	#[test]
	fn from_source_buffer_variant_matches_from_buffer() {
		let mut buf = CharBuffer::from_source(Source::Buffer(b"int x;".to_vec()), None, None).unwrap();
		assert_eq!(collect(&mut buf), "int x;");
	}

	#[test]
	fn source_filename_hint_only_set_for_filename_variant() {
		assert_eq!(Source::Filename("a.c".to_string()).filename_hint(), Some("a.c"));
		assert_eq!(Source::Buffer(Vec::new()).filename_hint(), None);
	}

	#[test]
	fn missing_file_is_input_error() {
		let err = CharBuffer::from_filename("/nonexistent/path/to/file.c", None, None).unwrap_err();
		assert!(matches!(err, Error::Input(_)));
	}
}
