/*!
# TokenLexer

Implements §4.2: consumes characters from a [`crate::charbuffer::CharBuffer`]
and produces `LITERAL` [`Token`]s typed by a language-specific lexical class.
Grounded on `rxml/src/lexer/mod.rs`'s `Token` production from a char source
(tab-size column accounting, `TokenMetrics`-style position stamping)
restructured here for generic source-code lexing rather than XML lexing; the
keyword classification itself is delegated to a [`grammar::LanguageGrammar`]
per §1's scoping-out of full per-language grammars.
*/
pub mod grammar;

use crate::charbuffer::CharBuffer;
use crate::elements;
use crate::error::Result;
use crate::language::Language;
use crate::token::{Position, Token};

/// Lexical sub-classification of a `LITERAL` token, carried in
/// [`Token::ty`]. Distinct numeric space from [`crate::elements::ElementTable`]
/// (markup) types; the two are never confused because [`crate::token::Category`]
/// tags which space applies.
pub const LEX_IDENTIFIER: u16 = 1;
pub const LEX_KEYWORD: u16 = 2;
pub const LEX_TYPE_KEYWORD: u16 = 3;
pub const LEX_CONTROL_KEYWORD: u16 = 4;
pub const LEX_INTEGER: u16 = 10;
pub const LEX_FLOAT: u16 = 11;
pub const LEX_STRING: u16 = 12;
pub const LEX_CHAR: u16 = 13;
pub const LEX_OPERATOR: u16 = 20;
pub const LEX_PUNCTUATOR: u16 = 21;
pub const LEX_LINE_COMMENT: u16 = 30;
pub const LEX_BLOCK_COMMENT: u16 = 31;
pub const LEX_DOC_COMMENT: u16 = 32;
pub const LEX_PREPROC_START: u16 = 40;
pub const LEX_PREPROC_END: u16 = 41;
pub const LEX_NEWLINE: u16 = 50;
pub const LEX_WHITESPACE: u16 = 51;
pub const LEX_EOF: u16 = 60;

const PUNCTUATORS: &[char] = &['(', ')', '{', '}', '[', ']', ';', ',', '.', ':'];

/// Consumes decoded characters and emits lexical [`Token`]s, per §4.2.
///
/// The lexer holds a one-character pushback slot (`lookahead`) so multi-char
/// operators, comments and preprocessor lines can be recognized without the
/// `CharBuffer` itself needing to support pushback.
pub struct TokenLexer<'a> {
	chars: &'a mut CharBuffer,
	language: Language,
	lookahead: Option<char>,
	at_line_start: bool,
	in_preprocessor_line: bool,
	/// Extra tokens already produced (e.g. by splitting a string/comment run
	/// around an embedded C0 control byte) but not yet returned from `next`.
	pending: std::collections::VecDeque<Token>,
}

impl<'a> TokenLexer<'a> {
	pub fn new(chars: &'a mut CharBuffer, language: Language) -> TokenLexer<'a> {
		TokenLexer {
			chars,
			language,
			lookahead: None,
			at_line_start: true,
			in_preprocessor_line: false,
			pending: std::collections::VecDeque::new(),
		}
	}

	fn peek(&mut self) -> Result<Option<char>> {
		if self.lookahead.is_none() {
			self.lookahead = self.chars.next_char()?;
		}
		Ok(self.lookahead)
	}

	fn advance(&mut self) -> Result<Option<char>> {
		if let Some(c) = self.lookahead.take() {
			return Ok(Some(c));
		}
		self.chars.next_char()
	}

	fn pos(&self) -> Position {
		self.chars.position()
	}

	/// Produce the next lexical token, or `None` at end of input.
	///
	/// Occasionally returns a markup `EMPTY` token directly (the §4.2
	/// `escape` element for an unescaped C0 control byte), which the parser
	/// forwards to [`crate::writer::Output`] unchanged.
	pub fn next(&mut self) -> Result<Option<Token>> {
		if let Some(t) = self.pending.pop_front() {
			return Ok(Some(t));
		}

		let pos = self.pos();
		let c = match self.peek()? {
			None => return Ok(None),
			Some(c) => c,
		};

		if c == '\n' {
			self.advance()?;
			self.at_line_start = true;
			if self.in_preprocessor_line {
				self.in_preprocessor_line = false;
				// The terminating newline is part of the directive's source
				// text and must survive to `Output` for byte preservation
				// (§8 invariant 1); carried as text rather than an empty
				// markup token so `parse_preprocessor_line` can forward it
				// like any other literal.
				return Ok(Some(Token::literal(LEX_PREPROC_END, pos, "\n".to_string())));
			}
			return Ok(Some(Token::literal(LEX_NEWLINE, pos, "\n".to_string())));
		}

		if c.is_whitespace() {
			return Ok(Some(self.lex_whitespace_run(pos)?));
		}

		if (c as u32) < 0x20 && c != '\n' && c != '\t' {
			self.advance()?;
			return Ok(Some(Token::empty(elements::ESCAPE, pos).with_attr("char", format!("0x{:02X}", c as u32))));
		}

		let was_line_start = self.at_line_start;
		self.at_line_start = false;

		if c == '#' && was_line_start && self.language.has_cpp_preprocessor() {
			self.advance()?;
			self.in_preprocessor_line = true;
			return Ok(Some(Token::literal(LEX_PREPROC_START, pos, "#".to_string())));
		}

		if c == '/' {
			if let Some(tok) = self.try_lex_comment(pos)? {
				return Ok(Some(tok));
			}
		}

		if c == self.language.grammar().string_quote() {
			return Ok(Some(self.lex_delimited(pos, c, LEX_STRING)?));
		}
		if Some(c) == self.language.grammar().char_quote() {
			return Ok(Some(self.lex_delimited(pos, c, LEX_CHAR)?));
		}

		if c.is_ascii_digit() {
			return Ok(Some(self.lex_number(pos)?));
		}

		if is_identifier_start(c) {
			return Ok(Some(self.lex_identifier(pos)?));
		}

		if PUNCTUATORS.contains(&c) {
			self.advance()?;
			return Ok(Some(Token::literal(LEX_PUNCTUATOR, pos, c.to_string())));
		}

		Ok(Some(self.lex_operator(pos)?))
	}

	fn lex_whitespace_run(&mut self, pos: Position) -> Result<Token> {
		let mut text = String::new();
		while let Some(c) = self.peek()? {
			if c == '\n' || !c.is_whitespace() {
				break;
			}
			text.push(c);
			self.advance()?;
		}
		Ok(Token::literal(LEX_WHITESPACE, pos, text))
	}

	fn try_lex_comment(&mut self, pos: Position) -> Result<Option<Token>> {
		// peek 2 chars ahead without losing data: consume '/' tentatively,
		// check next char, and if it is not a comment opener, there is no
		// lexical lookahead-of-two available, so we special-case the only
		// two comment openers srcML needs ('//' and '/*').
		self.advance()?; // consume the first '/'
		let second = self.peek()?;
		match second {
			Some('/') if self.language.grammar().has_line_comments() => {
				self.advance()?;
				let mut text = "//".to_string();
				let is_doc = self.peek()? == Some('/');
				let kind = if is_doc { LEX_DOC_COMMENT } else { LEX_LINE_COMMENT };
				let mut seg_pos = pos;
				let mut extra = Vec::new();
				while let Some(c) = self.peek()? {
					if c == '\n' {
						break;
					}
					let char_pos = self.pos();
					self.advance()?;
					if split_on_c0_control(&mut extra, &mut text, seg_pos, kind, char_pos, c) {
						seg_pos = self.pos();
					}
				}
				Ok(Some(self.finish_segments(extra, text, seg_pos, kind, pos)))
			}
			Some('*') => {
				self.advance()?;
				let mut text = "/*".to_string();
				let is_doc = self.peek()? == Some('*');
				let kind = if is_doc { LEX_DOC_COMMENT } else { LEX_BLOCK_COMMENT };
				let mut seg_pos = pos;
				let mut extra = Vec::new();
				let mut prev = '\0';
				loop {
					let char_pos = self.pos();
					match self.advance()? {
						None => break,
						Some(c) => {
							if split_on_c0_control(&mut extra, &mut text, seg_pos, kind, char_pos, c) {
								seg_pos = self.pos();
								prev = '\0';
								continue;
							}
							if prev == '*' && c == '/' {
								break;
							}
							prev = c;
						}
					}
				}
				Ok(Some(self.finish_segments(extra, text, seg_pos, kind, pos)))
			}
			_ => {
				// not a comment: this was a plain '/' operator (possibly
				// the start of `/=`), handle it like any other operator by
				// pushing the consumed '/' back through a literal text we
				// reconstruct here, then let lex_operator_tail continue.
				let tail = self.lex_operator_tail("/".to_string())?;
				Ok(Some(Token::literal(LEX_OPERATOR, pos, tail)))
			}
		}
	}

	/// Flush the accumulated text/escape segments of a multi-char run (string,
	/// char literal or comment) into a single returned token, queueing any
	/// extra segments in `self.pending` for subsequent `next` calls. Mirrors
	/// the single-token-per-call contract of `next` while still letting a run
	/// contain interleaved `escape` elements (§4.2).
	fn finish_segments(&mut self, mut extra: Vec<Token>, text: String, seg_pos: Position, kind: u16, whole_pos: Position) -> Token {
		if extra.is_empty() {
			return Token::literal(kind, whole_pos, text);
		}
		if !text.is_empty() {
			extra.push(Token::literal(kind, seg_pos, text));
		}
		let first = extra.remove(0);
		self.pending.extend(extra);
		first
	}

	fn lex_delimited(&mut self, pos: Position, quote: char, kind: u16) -> Result<Token> {
		let mut text = String::new();
		text.push(quote);
		self.advance()?;
		let mut seg_pos = pos;
		let mut extra = Vec::new();
		let mut escaped = false;
		loop {
			let char_pos = self.pos();
			match self.advance()? {
				None => break,
				Some(c) => {
					if split_on_c0_control(&mut extra, &mut text, seg_pos, kind, char_pos, c) {
						seg_pos = self.pos();
						escaped = false;
						continue;
					}
					if escaped {
						escaped = false;
					} else if c == '\\' {
						escaped = true;
					} else if c == quote {
						break;
					} else if c == '\n' {
						break;
					}
				}
			}
		}
		Ok(self.finish_segments(extra, text, seg_pos, kind, pos))
	}

	fn lex_number(&mut self, pos: Position) -> Result<Token> {
		let mut text = String::new();
		let mut is_float = false;
		while let Some(c) = self.peek()? {
			if c.is_ascii_digit() {
				text.push(c);
				self.advance()?;
			} else if c == '.' && !is_float {
				is_float = true;
				text.push(c);
				self.advance()?;
			} else if (c == 'e' || c == 'E') && !text.is_empty() {
				is_float = true;
				text.push(c);
				self.advance()?;
				if matches!(self.peek()?, Some('+') | Some('-')) {
					text.push(self.advance()?.unwrap());
				}
			} else if c.is_alphabetic() || c == '_' {
				// numeric literal suffix (u, l, ul, f, ...)
				text.push(c);
				self.advance()?;
			} else {
				break;
			}
		}
		Ok(Token::literal(if is_float { LEX_FLOAT } else { LEX_INTEGER }, pos, text))
	}

	fn lex_identifier(&mut self, pos: Position) -> Result<Token> {
		let mut text = String::new();
		while let Some(c) = self.peek()? {
			if is_identifier_continue(c) {
				text.push(c);
				self.advance()?;
			} else {
				break;
			}
		}
		let grammar = self.language.grammar();
		let kind = if grammar.is_type_keyword(&text) {
			LEX_TYPE_KEYWORD
		} else if grammar.is_control_keyword(&text) {
			LEX_CONTROL_KEYWORD
		} else if grammar.is_keyword(&text) {
			LEX_KEYWORD
		} else {
			LEX_IDENTIFIER
		};
		Ok(Token::literal(kind, pos, text))
	}

	fn lex_operator(&mut self, pos: Position) -> Result<Token> {
		let first = self.advance()?.expect("checked by caller");
		let text = self.lex_operator_tail(first.to_string())?;
		Ok(Token::literal(LEX_OPERATOR, pos, text))
	}

	/// Greedily extend an already-started operator with additional operator
	/// characters (covers multi-char operators like `==`, `->`, `<<=`, `::`
	/// without a full per-language operator table).
	fn lex_operator_tail(&mut self, mut text: String) -> Result<String> {
		const OP_CHARS: &[char] =
			&['=', '+', '-', '*', '/', '%', '<', '>', '!', '&', '|', '^', '~', ':', '?'];
		while let Some(c) = self.peek()? {
			if OP_CHARS.contains(&c) {
				text.push(c);
				self.advance()?;
			} else {
				break;
			}
		}
		Ok(text)
	}
}

/// Shared by `lex_delimited` and the comment branches of `try_lex_comment`:
/// a C0 control byte (other than `\n`/`\t`) occurring *inside* a delimited
/// run must still become an `escape` element rather than landing verbatim in
/// a `LITERAL`'s text (§4.2; an un-escaped C0 byte in element text is not
/// legal XML, §8 property 2). Flushes `text` accumulated so far as a literal
/// segment, pushes the `escape` token, and reports whether a split happened
/// so the caller can reset per-run state (e.g. `escaped`/`prev`) and advance
/// `seg_pos`. When `c` is not a control byte, it is appended to `text` as
/// usual and this returns `false`.
fn split_on_c0_control(extra: &mut Vec<Token>, text: &mut String, seg_pos: Position, kind: u16, char_pos: Position, c: char) -> bool {
	if (c as u32) < 0x20 && c != '\n' && c != '\t' {
		if !text.is_empty() {
			extra.push(Token::literal(kind, seg_pos, std::mem::take(text)));
		}
		extra.push(Token::empty(elements::ESCAPE, char_pos).with_attr("char", format!("0x{:02X}", c as u32)));
		true
	} else {
		text.push(c);
		false
	}
}

fn is_identifier_start(c: char) -> bool {
	c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_continue(c: char) -> bool {
	c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::charbuffer::CharBuffer;

	fn lex_all(src: &str, lang: Language) -> Vec<Token> {
		let mut buf = CharBuffer::from_buffer(src.as_bytes().to_vec(), None, None).unwrap();
		let mut lexer = TokenLexer::new(&mut buf, lang);
		let mut out = Vec::new();
		while let Some(t) = lexer.next().unwrap() {
			out.push(t);
		}
		out
	}

	#[test]
	fn lexes_identifier_and_keyword() {
		let toks = lex_all("int x", Language::C);
		assert_eq!(toks[0].ty, LEX_TYPE_KEYWORD);
		assert_eq!(toks[0].text, "int");
		assert_eq!(toks[2].ty, LEX_IDENTIFIER);
		assert_eq!(toks[2].text, "x");
	}

	#[test]
	fn lexes_integer_and_float() {
		let toks = lex_all("1 2.5", Language::C);
		assert_eq!(toks[0].ty, LEX_INTEGER);
		assert_eq!(toks[2].ty, LEX_FLOAT);
		assert_eq!(toks[2].text, "2.5");
	}

	#[test]
	fn lexes_string_literal_with_escape() {
		let toks = lex_all(r#""a\"b""#, Language::C);
		assert_eq!(toks[0].ty, LEX_STRING);
		assert_eq!(toks[0].text, r#""a\"b""#);
	}

	#[test]
	fn lexes_line_comment() {
		let toks = lex_all("// hi\nint", Language::Cpp);
		assert_eq!(toks[0].ty, LEX_LINE_COMMENT);
		assert_eq!(toks[0].text, "// hi");
	}

	#[test]
	fn lexes_block_comment() {
		let toks = lex_all("/* hi */x", Language::C);
		assert_eq!(toks[0].ty, LEX_BLOCK_COMMENT);
		assert_eq!(toks[0].text, "/* hi */");
	}

	#[test]
	fn lexes_doc_comment_variant() {
		let toks = lex_all("/** doc */x", Language::Java);
		assert_eq!(toks[0].ty, LEX_DOC_COMMENT);
	}

	#[test]
	fn lexes_preprocessor_start_and_end() {
		let toks = lex_all("#include <a.h>\nint", Language::C);
		assert_eq!(toks[0].ty, LEX_PREPROC_START);
		let end_idx = toks.iter().position(|t| t.ty == LEX_PREPROC_END).unwrap();
		assert!(end_idx > 0);
	}

	#[test]
	fn csharp_has_no_preprocessor_start_token() {
		let toks = lex_all("#if x", Language::CSharp);
		assert_ne!(toks[0].ty, LEX_PREPROC_START);
	}

	#[test]
	fn emits_escape_for_c0_control_byte() {
		let toks = lex_all("x\u{01}y", Language::C);
		let escape = toks.iter().find(|t| t.ty == elements::ESCAPE).unwrap();
		assert!(escape.is_markup());
		assert_eq!(escape.attrs, vec![("char", "0x01".to_string())]);
	}

	#[test]
	fn multi_char_operator_is_one_token() {
		let toks = lex_all("a == b", Language::C);
		let op = toks.iter().find(|t| t.ty == LEX_OPERATOR).unwrap();
		assert_eq!(op.text, "==");
	}
}
