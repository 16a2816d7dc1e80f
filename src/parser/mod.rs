/*!
# StreamParser

Implements §4.3: wraps lexical tokens from [`crate::lexer::TokenLexer`] in
correctly nested `START`/`END`/`EMPTY` markup tokens, without attempting a
full grammar for any of the four supported languages (§1 scopes "detailed
C++/Java grammar productions" out; §4.3 itself says this is "not a full
grammar parser").

Grounded on `rxml/src/parser/raw.rs`'s token-driven state machine shape and
`original_source/src/parser/StateStack.hpp`'s open-element-stack-per-mode
bookkeeping, reconstructed at the level of detail the spec asks for: enough
to recognize functions, declarations, the common control-flow statements,
comments and preprocessor lines, using a bounded look-back window rather than
a lookahead grammar.

## Retroactive markup

A declaration's leading tokens (`int f`) look identical whether the
declarator turns out to be a function or a plain variable; srcML only knows
once it has seen whether `(...)` is followed by `{` or `;`. Per §9's
"retroactive markup via TokenBuffer" design note, this parser stages such
tokens in [`crate::tokenbuffer::TokenBuffer`] (the *same* bounded window used
for [`StreamParser::next`]'s output) and splices the resolved wrapper's
`START` token into the window behind them once the ambiguity resolves
([`StreamParser::splice_start_at_mark`]), rather than backtracking or
buffering a side channel.

Tokens are only handed to the caller (via [`StreamParser::next`]) once they
have left this window — checkpoints happen between statements, once no
further retroactive edit is possible.
*/
use std::collections::VecDeque;

use crate::elements;
use crate::error::{Error, Result};
use crate::language::Language;
use crate::lexer::{self, TokenLexer};
use crate::mode::ModeFlags;
use crate::modestack::ModeStack;
use crate::token::{Category, Position, Token, TokenType};
use crate::tokenbuffer::TokenBuffer;

const LOOKBACK_CAPACITY: usize = 64;

/// A fully-materialized view of the raw tokens produced by the lexer for one
/// unit, with simple random-access lookahead. Building this eagerly (rather
/// than pulling the lexer lazily, token by token, as the structural
/// recognizer runs) keeps the recognizer's lookahead logic simple; the
/// lexer itself remains a genuinely streaming, single-token-at-a-time
/// component in isolation (§4.2).
struct Cursor {
	tokens: Vec<Token>,
	pos: usize,
}

impl Cursor {
	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.pos)
	}

	fn advance(&mut self) -> Option<Token> {
		if self.pos < self.tokens.len() {
			let t = self.tokens[self.pos].clone();
			self.pos += 1;
			Some(t)
		} else {
			None
		}
	}
}

fn directive_element(word: &str) -> TokenType {
	match word {
		"include" => elements::CPP_INCLUDE,
		"define" => elements::CPP_DEFINE,
		"undef" => elements::CPP_UNDEF,
		"if" => elements::CPP_IF,
		"ifdef" => elements::CPP_IFDEF,
		"ifndef" => elements::CPP_IFNDEF,
		"else" => elements::CPP_ELSE,
		"elif" => elements::CPP_ELIF,
		"endif" => elements::CPP_ENDIF,
		"pragma" => elements::CPP_PRAGMA,
		_ => elements::CPP_DIRECTIVE,
	}
}

/// Recognizes nested syntactic constructs over a lexical token stream and
/// emits the corresponding markup, per §4.3.
pub struct StreamParser<'a> {
	lexer: TokenLexer<'a>,
	#[allow(dead_code)]
	language: Language,
	mode_stack: ModeStack,
	buffer: TokenBuffer,
	ready: VecDeque<Token>,
	primed: bool,
}

impl<'a> StreamParser<'a> {
	pub fn new(lexer: TokenLexer<'a>, language: Language) -> StreamParser<'a> {
		StreamParser {
			lexer,
			language,
			mode_stack: ModeStack::new(),
			buffer: TokenBuffer::new(LOOKBACK_CAPACITY),
			ready: VecDeque::new(),
			primed: false,
		}
	}

	/// Pull the next token (literal or markup) in the unit's output order.
	/// Returns `None` once every input token has been consumed and every
	/// still-open element has been force-closed at unit end.
	pub fn next(&mut self) -> Result<Option<Token>> {
		if !self.primed {
			self.prime()?;
		}
		Ok(self.ready.pop_front())
	}

	fn prime(&mut self) -> Result<()> {
		self.primed = true;
		let mut raw = Vec::new();
		while let Some(t) = self.lexer.next()? {
			raw.push(t);
		}
		let mut cur = Cursor { tokens: raw, pos: 0 };
		self.parse_sequence(&mut cur, false)?;
		let trailing = self.mode_stack.end_all_modes();
		for ty in trailing {
			self.emit(Token::end(ty, Position::new(0, 0)));
		}
		self.checkpoint();
		Ok(())
	}

	fn emit(&mut self, tok: Token) {
		self.buffer.push(tok);
	}

	/// Flush every token currently in the look-back window to the ready
	/// queue. Safe to call once a construct has fully resolved and no
	/// further retroactive edit will reach back into it.
	fn checkpoint(&mut self) {
		while let Some(t) = self.buffer.force_consume_oldest() {
			self.ready.push_back(t);
		}
	}

	/// A splice point recorded jointly in the [`TokenBuffer`] window and in
	/// the current mode's open-element stack, so that
	/// [`StreamParser::splice_start_at_mark`] can be called more than once at
	/// the same logical point and have both structures agree on nesting
	/// order (see that method's doc comment).
	fn mark(&self) -> (usize, usize) {
		(self.buffer.len(), self.mode_stack.open_element_count())
	}

	/// Insert a `START` token immediately before everything emitted since
	/// `mark`, and record the element as open for later
	/// [`StreamParser::close_element`]. Calling this more than once with the
	/// same `mark` splices the innermost wrapper first: each subsequent call
	/// ends up *outside* the previous one's token in the stream (inserted at
	/// the same buffer position, shoving the earlier insertion further in),
	/// so it must likewise end up *below* the earlier one on the
	/// open-element stack — the earlier (inner) element has to close first.
	/// [`ModeStack::insert_open_element`] at the recorded element-mark
	/// achieves that the same way `TokenBuffer::insert_at` does for the
	/// token window.
	fn splice_start_at_mark(&mut self, mark: (usize, usize), ty: TokenType, pos: Position) {
		let (buf_mark, elem_mark) = mark;
		let n = self.buffer.len() - buf_mark;
		self.buffer.insert_at(n, Token::start(ty, pos));
		self.mode_stack.insert_open_element(elem_mark, ty);
	}

	fn open_element(&mut self, ty: TokenType, pos: Position) {
		self.mode_stack.push_open_element(ty);
		self.emit(Token::start(ty, pos));
	}

	fn close_element(&mut self, ty: TokenType, pos: Position) -> Result<()> {
		self.mode_stack.pop_open_element(ty).map_err(Error::from)?;
		self.emit(Token::end(ty, pos));
		Ok(())
	}

	/// Forward any whitespace, newline, comment or escape tokens sitting at
	/// the cursor, preserving them verbatim in the output (byte preservation,
	/// §8 invariant 1) before the caller inspects the next "real" token.
	fn forward_trivia(&mut self, cur: &mut Cursor) -> Result<()> {
		loop {
			match cur.peek() {
				Some(t) if t.ty == lexer::LEX_WHITESPACE || t.ty == lexer::LEX_NEWLINE => {
					self.emit(cur.advance().expect("peeked"));
				}
				Some(t) if t.category == Category::Empty && t.ty == elements::ESCAPE => {
					self.emit(cur.advance().expect("peeked"));
				}
				Some(t)
					if t.ty == lexer::LEX_LINE_COMMENT
						|| t.ty == lexer::LEX_BLOCK_COMMENT
						|| t.ty == lexer::LEX_DOC_COMMENT =>
				{
					self.parse_comment(cur)?;
				}
				_ => break,
			}
		}
		Ok(())
	}

	/// Parse a sequence of top-level items: preprocessor lines, comments and
	/// statements/declarations, stopping at a `}` when `stop_at_close_brace`
	/// (used for block content) or at end of input (used at unit level).
	fn parse_sequence(&mut self, cur: &mut Cursor, stop_at_close_brace: bool) -> Result<()> {
		loop {
			self.forward_trivia(cur)?;
			match cur.peek() {
				None => break,
				Some(t) if stop_at_close_brace && t.text == "}" => break,
				Some(t) if t.ty == lexer::LEX_PREPROC_START => {
					self.parse_preprocessor_line(cur)?;
					self.checkpoint();
				}
				Some(_) => {
					self.parse_statement(cur)?;
				}
			}
		}
		Ok(())
	}

	fn parse_comment(&mut self, cur: &mut Cursor) -> Result<()> {
		let tok = cur.advance().expect("caller checked comment token is present");
		let pos = tok.pos;
		self.open_element(elements::COMMENT, pos);
		self.emit(tok);
		self.close_element(elements::COMMENT, pos)
	}

	fn parse_preprocessor_line(&mut self, cur: &mut Cursor) -> Result<()> {
		let start_tok = cur.advance().expect("caller checked preproc start token");
		let pos = start_tok.pos;
		self.mode_stack.push(ModeFlags::PREPROCESSOR_LINE, true);
		let directive_word = {
			let mut idx = cur.pos;
			loop {
				match cur.tokens.get(idx) {
					None => break String::new(),
					Some(t) if t.ty == lexer::LEX_WHITESPACE => {
						idx += 1;
					}
					Some(t) => break t.text.clone(),
				}
			}
		};
		let directive_ty = directive_element(&directive_word);
		self.open_element(directive_ty, pos);
		self.emit(start_tok);
		loop {
			match cur.peek() {
				None => break,
				Some(t) if t.ty == lexer::LEX_PREPROC_END => {
					// Carries the directive's terminating "\n" as text (§8
					// invariant 1); forward it like any other literal rather
					// than dropping it.
					self.emit(cur.advance().expect("peeked"));
					break;
				}
				Some(_) => {
					self.emit(cur.advance().expect("peeked"));
				}
			}
		}
		self.close_element(directive_ty, pos)?;
		self.mode_stack.pop().map_err(Error::from)?;
		Ok(())
	}

	fn parse_statement(&mut self, cur: &mut Cursor) -> Result<()> {
		self.forward_trivia(cur)?;
		let tok = match cur.peek() {
			Some(t) => t.clone(),
			None => return Ok(()),
		};
		match tok.text.as_str() {
			"return" => self.parse_return(cur),
			"if" => self.parse_if(cur),
			"while" => self.parse_while(cur),
			"for" => self.parse_for(cur),
			"switch" => self.parse_switch(cur),
			"case" | "default" => self.parse_case(cur),
			"try" => self.parse_try(cur),
			"throw" => self.parse_throw(cur),
			"break" => self.parse_simple_keyword_stmt(cur, elements::BREAK_STMT),
			"continue" => self.parse_simple_keyword_stmt(cur, elements::CONTINUE_STMT),
			"{" => self.parse_block(cur),
			_ => {
				if tok.ty == lexer::LEX_TYPE_KEYWORD {
					self.parse_declaration_or_function(cur)
				} else {
					self.parse_expr_statement(cur)
				}
			}
		}
	}

	fn parse_block(&mut self, cur: &mut Cursor) -> Result<()> {
		let pos = cur.peek().expect("caller checked '{' is present").pos;
		self.open_element(elements::BLOCK, pos);
		self.emit(cur.advance().expect("peeked"));
		self.forward_trivia(cur)?;
		let content_pos = cur.peek().map(|t| t.pos).unwrap_or(pos);
		self.open_element(elements::BLOCK_CONTENT, content_pos);
		self.parse_sequence(cur, true)?;
		self.close_element(elements::BLOCK_CONTENT, content_pos)?;
		self.forward_trivia(cur)?;
		if let Some(t) = cur.peek() {
			if t.text == "}" {
				self.emit(cur.advance().expect("peeked"));
			}
		}
		self.close_element(elements::BLOCK, pos)
	}

	fn next_is_identifier_after(&self, cur: &Cursor) -> bool {
		let mut i = cur.pos + 1;
		while let Some(t) = cur.tokens.get(i) {
			if t.ty == lexer::LEX_WHITESPACE || t.ty == lexer::LEX_NEWLINE {
				i += 1;
				continue;
			}
			return t.ty == lexer::LEX_IDENTIFIER || t.ty == lexer::LEX_TYPE_KEYWORD;
		}
		false
	}

	fn peek_is_call(&self, cur: &Cursor) -> bool {
		let mut i = cur.pos + 1;
		while let Some(t) = cur.tokens.get(i) {
			if t.ty == lexer::LEX_WHITESPACE {
				i += 1;
				continue;
			}
			return t.text == "(";
		}
		false
	}

	/// `<type>...</type> <name>...</name>`, stopping once the declarator
	/// name has been consumed. Shared by declarations, functions and
	/// parameters.
	fn parse_type_and_name(&mut self, cur: &mut Cursor) -> Result<()> {
		let pos = cur.peek().map(|t| t.pos).unwrap_or(Position::new(0, 0));
		self.open_element(elements::TYPE, pos);
		loop {
			self.forward_trivia(cur)?;
			match cur.peek() {
				Some(t) if t.ty == lexer::LEX_TYPE_KEYWORD || t.ty == lexer::LEX_KEYWORD => {
					self.emit(cur.advance().expect("peeked"));
				}
				Some(t) if t.ty == lexer::LEX_OPERATOR && (t.text == "*" || t.text == "&") => {
					self.emit(cur.advance().expect("peeked"));
				}
				Some(t) if t.ty == lexer::LEX_IDENTIFIER && self.next_is_identifier_after(cur) => {
					self.emit(cur.advance().expect("peeked"));
				}
				_ => break,
			}
		}
		self.close_element(elements::TYPE, pos)?;
		self.forward_trivia(cur)?;
		let name_pos = cur.peek().map(|t| t.pos).unwrap_or(pos);
		self.open_element(elements::NAME, name_pos);
		if let Some(t) = cur.peek() {
			if t.ty == lexer::LEX_IDENTIFIER {
				self.emit(cur.advance().expect("peeked"));
			}
		}
		self.close_element(elements::NAME, name_pos)
	}

	fn parse_declaration_or_function(&mut self, cur: &mut Cursor) -> Result<()> {
		let start_pos = cur.peek().expect("caller checked a type keyword is present").pos;
		let leading_keyword = cur.peek().expect("checked above").text.clone();
		let mark = self.mark();
		self.parse_type_and_name(cur)?;
		self.forward_trivia(cur)?;
		let sig = cur.peek().map(|t| t.text.clone());
		match sig.as_deref() {
			Some("(") => {
				self.parse_parameter_list(cur)?;
				self.forward_trivia(cur)?;
				let is_def = cur.peek().map(|t| t.text.as_str()) == Some("{");
				let wrapper_ty = if is_def { elements::FUNCTION } else { elements::FUNCTION_DECL };
				self.splice_start_at_mark(mark, wrapper_ty, start_pos);
				if is_def {
					self.parse_block(cur)?;
				} else {
					self.forward_trivia(cur)?;
					if let Some(t) = cur.peek() {
						if t.text == ";" {
							self.emit(cur.advance().expect("peeked"));
						}
					}
				}
				self.close_element(wrapper_ty, start_pos)?;
			}
			Some("{") if matches!(leading_keyword.as_str(), "class" | "struct" | "enum" | "namespace") => {
				let wrapper_ty = match leading_keyword.as_str() {
					"class" => elements::CLASS,
					"struct" => elements::STRUCT,
					"enum" => elements::ENUM,
					_ => elements::NAMESPACE_BLOCK,
				};
				self.splice_start_at_mark(mark, wrapper_ty, start_pos);
				self.parse_block(cur)?;
				self.close_element(wrapper_ty, start_pos)?;
			}
			_ => {
				self.splice_start_at_mark(mark, elements::DECL, start_pos);
				self.splice_start_at_mark(mark, elements::DECL_STMT, start_pos);
				self.forward_trivia(cur)?;
				if let Some(t) = cur.peek() {
					if t.text == "=" {
						let eq_pos = t.pos;
						self.open_element(elements::INIT, eq_pos);
						self.emit(cur.advance().expect("peeked"));
						self.forward_trivia(cur)?;
						self.parse_expr_until(cur, &[";", ","])?;
						self.close_element(elements::INIT, eq_pos)?;
					}
				}
				self.forward_trivia(cur)?;
				if let Some(t) = cur.peek() {
					if t.text == ";" {
						self.emit(cur.advance().expect("peeked"));
					}
				}
				self.close_element(elements::DECL, start_pos)?;
				self.close_element(elements::DECL_STMT, start_pos)?;
			}
		}
		self.checkpoint();
		Ok(())
	}

	fn parse_parameter_list(&mut self, cur: &mut Cursor) -> Result<()> {
		let pos = cur.peek().expect("caller checked '(' is present").pos;
		self.open_element(elements::PARAMETER_LIST, pos);
		self.emit(cur.advance().expect("peeked"));
		loop {
			self.forward_trivia(cur)?;
			match cur.peek().map(|t| t.text.clone()) {
				Some(ref s) if s == ")" => {
					self.emit(cur.advance().expect("peeked"));
					break;
				}
				None => break,
				_ => self.parse_parameter(cur)?,
			}
		}
		self.close_element(elements::PARAMETER_LIST, pos)
	}

	fn parse_parameter(&mut self, cur: &mut Cursor) -> Result<()> {
		let pos = cur.peek().expect("caller checked a parameter token is present").pos;
		self.open_element(elements::PARAMETER, pos);
		self.open_element(elements::DECL, pos);
		self.parse_type_and_name(cur)?;
		self.close_element(elements::DECL, pos)?;
		self.forward_trivia(cur)?;
		if let Some(t) = cur.peek() {
			if t.text == "," {
				self.emit(cur.advance().expect("peeked"));
			}
		}
		self.close_element(elements::PARAMETER, pos)
	}

	fn parse_call(&mut self, cur: &mut Cursor) -> Result<()> {
		let pos = cur.peek().expect("caller checked an identifier is present").pos;
		self.open_element(elements::CALL, pos);
		self.open_element(elements::NAME, pos);
		self.emit(cur.advance().expect("peeked"));
		self.close_element(elements::NAME, pos)?;
		self.forward_trivia(cur)?;
		self.parse_argument_list(cur)?;
		self.close_element(elements::CALL, pos)
	}

	fn parse_argument_list(&mut self, cur: &mut Cursor) -> Result<()> {
		let pos = cur.peek().expect("caller checked '(' is present").pos;
		self.open_element(elements::ARGUMENT_LIST, pos);
		self.emit(cur.advance().expect("peeked"));
		loop {
			self.forward_trivia(cur)?;
			match cur.peek().map(|t| t.text.clone()) {
				Some(ref s) if s == ")" => {
					self.emit(cur.advance().expect("peeked"));
					break;
				}
				None => break,
				_ => {
					let apos = cur.peek().expect("checked above").pos;
					self.open_element(elements::ARGUMENT, apos);
					self.parse_expr_until(cur, &[",", ")"])?;
					self.close_element(elements::ARGUMENT, apos)?;
					self.forward_trivia(cur)?;
					if let Some(t) = cur.peek() {
						if t.text == "," {
							self.emit(cur.advance().expect("peeked"));
						}
					}
				}
			}
		}
		self.close_element(elements::ARGUMENT_LIST, pos)
	}

	/// `<expr>...</expr>` wrapping tokens up to (not including) the first
	/// token at parenthesis-depth 0 whose text is in `stops`.
	fn parse_expr_until(&mut self, cur: &mut Cursor, stops: &[&str]) -> Result<()> {
		let pos = cur.peek().map(|t| t.pos).unwrap_or(Position::new(0, 0));
		self.open_element(elements::EXPR, pos);
		let mut depth: i32 = 0;
		loop {
			self.forward_trivia(cur)?;
			match cur.peek() {
				None => break,
				Some(t) => {
					if depth == 0 && stops.contains(&t.text.as_str()) {
						break;
					}
					if t.text == "(" {
						depth += 1;
					} else if t.text == ")" {
						if depth == 0 {
							break;
						}
						depth -= 1;
					}
					if t.ty == lexer::LEX_IDENTIFIER && self.peek_is_call(cur) {
						self.parse_call(cur)?;
						continue;
					}
					self.emit(cur.advance().expect("peeked"));
				}
			}
		}
		self.close_element(elements::EXPR, pos)
	}

	fn parse_condition(&mut self, cur: &mut Cursor) -> Result<()> {
		let pos = cur.peek().expect("caller checked '(' is present").pos;
		self.open_element(elements::CONDITION, pos);
		self.emit(cur.advance().expect("peeked"));
		self.parse_expr_until(cur, &[")"])?;
		self.forward_trivia(cur)?;
		if let Some(t) = cur.peek() {
			if t.text == ")" {
				self.emit(cur.advance().expect("peeked"));
			}
		}
		self.close_element(elements::CONDITION, pos)
	}

	fn parse_return(&mut self, cur: &mut Cursor) -> Result<()> {
		let pos = cur.peek().expect("caller checked 'return' is present").pos;
		self.open_element(elements::RETURN, pos);
		self.emit(cur.advance().expect("peeked"));
		self.forward_trivia(cur)?;
		if cur.peek().map(|t| t.text.as_str()) != Some(";") {
			self.parse_expr_until(cur, &[";"])?;
		}
		self.forward_trivia(cur)?;
		if let Some(t) = cur.peek() {
			if t.text == ";" {
				self.emit(cur.advance().expect("peeked"));
			}
		}
		self.close_element(elements::RETURN, pos)?;
		self.checkpoint();
		Ok(())
	}

	fn parse_if(&mut self, cur: &mut Cursor) -> Result<()> {
		let pos = cur.peek().expect("caller checked 'if' is present").pos;
		self.open_element(elements::IF_STMT, pos);
		self.emit(cur.advance().expect("peeked"));
		self.forward_trivia(cur)?;
		self.parse_condition(cur)?;
		self.forward_trivia(cur)?;
		let then_pos = cur.peek().map(|t| t.pos).unwrap_or(pos);
		self.open_element(elements::THEN, then_pos);
		self.parse_statement(cur)?;
		self.close_element(elements::THEN, then_pos)?;
		self.forward_trivia(cur)?;
		if cur.peek().map(|t| t.text.as_str()) == Some("else") {
			let else_pos = cur.peek().expect("checked above").pos;
			self.open_element(elements::ELSE, else_pos);
			self.emit(cur.advance().expect("peeked"));
			self.forward_trivia(cur)?;
			self.parse_statement(cur)?;
			self.close_element(elements::ELSE, else_pos)?;
		}
		self.close_element(elements::IF_STMT, pos)?;
		self.checkpoint();
		Ok(())
	}

	fn parse_while(&mut self, cur: &mut Cursor) -> Result<()> {
		let pos = cur.peek().expect("caller checked 'while' is present").pos;
		self.open_element(elements::WHILE_STMT, pos);
		self.emit(cur.advance().expect("peeked"));
		self.forward_trivia(cur)?;
		self.parse_condition(cur)?;
		self.forward_trivia(cur)?;
		self.parse_statement(cur)?;
		self.close_element(elements::WHILE_STMT, pos)?;
		self.checkpoint();
		Ok(())
	}

	fn parse_for(&mut self, cur: &mut Cursor) -> Result<()> {
		let pos = cur.peek().expect("caller checked 'for' is present").pos;
		self.open_element(elements::FOR_STMT, pos);
		self.emit(cur.advance().expect("peeked"));
		self.forward_trivia(cur)?;
		let ctrl_pos = cur.peek().map(|t| t.pos).unwrap_or(pos);
		self.open_element(elements::FOR_CONTROL, ctrl_pos);
		if cur.peek().map(|t| t.text.as_str()) == Some("(") {
			self.emit(cur.advance().expect("peeked"));
		}
		self.forward_trivia(cur)?;
		if cur.peek().map(|t| t.text.as_str()) != Some(";") {
			self.parse_expr_until(cur, &[";"])?;
		}
		self.forward_trivia(cur)?;
		if cur.peek().map(|t| t.text.as_str()) == Some(";") {
			self.emit(cur.advance().expect("peeked"));
		}
		self.forward_trivia(cur)?;
		if cur.peek().map(|t| t.text.as_str()) != Some(";") {
			self.parse_expr_until(cur, &[";"])?;
		}
		self.forward_trivia(cur)?;
		if cur.peek().map(|t| t.text.as_str()) == Some(";") {
			self.emit(cur.advance().expect("peeked"));
		}
		self.forward_trivia(cur)?;
		let incr_pos = cur.peek().map(|t| t.pos).unwrap_or(ctrl_pos);
		self.open_element(elements::INCR, incr_pos);
		if cur.peek().map(|t| t.text.as_str()) != Some(")") {
			self.parse_expr_until(cur, &[")"])?;
		}
		self.close_element(elements::INCR, incr_pos)?;
		self.forward_trivia(cur)?;
		if cur.peek().map(|t| t.text.as_str()) == Some(")") {
			self.emit(cur.advance().expect("peeked"));
		}
		self.close_element(elements::FOR_CONTROL, ctrl_pos)?;
		self.forward_trivia(cur)?;
		self.parse_statement(cur)?;
		self.close_element(elements::FOR_STMT, pos)?;
		self.checkpoint();
		Ok(())
	}

	fn parse_switch(&mut self, cur: &mut Cursor) -> Result<()> {
		let pos = cur.peek().expect("caller checked 'switch' is present").pos;
		self.open_element(elements::SWITCH_STMT, pos);
		self.emit(cur.advance().expect("peeked"));
		self.forward_trivia(cur)?;
		self.parse_condition(cur)?;
		self.forward_trivia(cur)?;
		self.parse_statement(cur)?;
		self.close_element(elements::SWITCH_STMT, pos)?;
		self.checkpoint();
		Ok(())
	}

	fn parse_case(&mut self, cur: &mut Cursor) -> Result<()> {
		let pos = cur.peek().expect("caller checked 'case'/'default' is present").pos;
		self.open_element(elements::CASE, pos);
		self.emit(cur.advance().expect("peeked"));
		self.forward_trivia(cur)?;
		if cur.peek().map(|t| t.text.as_str()) != Some(":") {
			self.parse_expr_until(cur, &[":"])?;
		}
		self.forward_trivia(cur)?;
		if cur.peek().map(|t| t.text.as_str()) == Some(":") {
			self.emit(cur.advance().expect("peeked"));
		}
		self.close_element(elements::CASE, pos)?;
		self.checkpoint();
		Ok(())
	}

	fn parse_try(&mut self, cur: &mut Cursor) -> Result<()> {
		let pos = cur.peek().expect("caller checked 'try' is present").pos;
		self.open_element(elements::TRY_STMT, pos);
		self.emit(cur.advance().expect("peeked"));
		self.forward_trivia(cur)?;
		self.parse_statement(cur)?;
		loop {
			self.forward_trivia(cur)?;
			if cur.peek().map(|t| t.text.as_str()) != Some("catch") {
				break;
			}
			let cpos = cur.peek().expect("checked above").pos;
			self.open_element(elements::CATCH, cpos);
			self.emit(cur.advance().expect("peeked"));
			self.forward_trivia(cur)?;
			if cur.peek().map(|t| t.text.as_str()) == Some("(") {
				self.parse_parameter_list(cur)?;
			}
			self.forward_trivia(cur)?;
			self.parse_statement(cur)?;
			self.close_element(elements::CATCH, cpos)?;
		}
		self.close_element(elements::TRY_STMT, pos)?;
		self.checkpoint();
		Ok(())
	}

	fn parse_throw(&mut self, cur: &mut Cursor) -> Result<()> {
		let pos = cur.peek().expect("caller checked 'throw' is present").pos;
		self.open_element(elements::THROW_STMT, pos);
		self.emit(cur.advance().expect("peeked"));
		self.forward_trivia(cur)?;
		if cur.peek().map(|t| t.text.as_str()) != Some(";") {
			self.parse_expr_until(cur, &[";"])?;
		}
		self.forward_trivia(cur)?;
		if cur.peek().map(|t| t.text.as_str()) == Some(";") {
			self.emit(cur.advance().expect("peeked"));
		}
		self.close_element(elements::THROW_STMT, pos)?;
		self.checkpoint();
		Ok(())
	}

	fn parse_simple_keyword_stmt(&mut self, cur: &mut Cursor, ty: TokenType) -> Result<()> {
		let pos = cur.peek().expect("caller checked the keyword is present").pos;
		self.open_element(ty, pos);
		self.emit(cur.advance().expect("peeked"));
		self.forward_trivia(cur)?;
		if cur.peek().map(|t| t.text.as_str()) == Some(";") {
			self.emit(cur.advance().expect("peeked"));
		}
		self.close_element(ty, pos)?;
		self.checkpoint();
		Ok(())
	}

	fn parse_expr_statement(&mut self, cur: &mut Cursor) -> Result<()> {
		let pos = cur.peek().expect("caller checked a token is present").pos;
		if cur.peek().map(|t| t.text.as_str()) == Some(";") {
			self.open_element(elements::EMPTY_STMT, pos);
			self.emit(cur.advance().expect("peeked"));
			self.close_element(elements::EMPTY_STMT, pos)?;
			self.checkpoint();
			return Ok(());
		}
		self.open_element(elements::EXPR_STMT, pos);
		self.parse_expr_until(cur, &[";"])?;
		self.forward_trivia(cur)?;
		if cur.peek().map(|t| t.text.as_str()) == Some(";") {
			self.emit(cur.advance().expect("peeked"));
		}
		self.close_element(elements::EXPR_STMT, pos)?;
		self.checkpoint();
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::charbuffer::CharBuffer;

	fn parse_all(src: &str, lang: Language) -> Vec<Token> {
		let mut buf = CharBuffer::from_buffer(src.as_bytes().to_vec(), None, None).unwrap();
		let lexer = TokenLexer::new(&mut buf, lang);
		let mut parser = StreamParser::new(lexer, lang);
		let mut out = Vec::new();
		while let Some(t) = parser.next().unwrap() {
			out.push(t);
		}
		out
	}

	fn reconstruct_text(toks: &[Token]) -> String {
		toks.iter().filter(|t| t.category == Category::Literal).map(|t| t.text.as_str()).collect()
	}

	fn starts_and_ends_balance(toks: &[Token]) -> bool {
		let mut stack = Vec::new();
		for t in toks {
			match t.category {
				Category::Start => stack.push(t.ty),
				Category::End => {
					if stack.pop() != Some(t.ty) {
						return false;
					}
				}
				_ => {}
			}
		}
		stack.is_empty()
	}

	#[test]
	fn s1_single_c_function_has_expected_shape() {
		let src = "int f(int x) { return x+1; }";
		let toks = parse_all(src, Language::C);
		assert!(starts_and_ends_balance(&toks));
		assert_eq!(reconstruct_text(&toks), src);
		assert!(toks.iter().any(|t| t.category == Category::Start && t.ty == elements::FUNCTION));
		assert!(toks.iter().any(|t| t.category == Category::Start && t.ty == elements::PARAMETER_LIST));
		assert!(toks.iter().any(|t| t.category == Category::Start && t.ty == elements::BLOCK));
		assert!(toks.iter().any(|t| t.category == Category::Start && t.ty == elements::RETURN));
	}

	#[test]
	fn s2_preprocessor_include_then_decl() {
		let src = "#include <stdio.h>\nint x;";
		let toks = parse_all(src, Language::C);
		assert!(starts_and_ends_balance(&toks));
		assert_eq!(reconstruct_text(&toks), src);
		assert!(toks.iter().any(|t| t.category == Category::Start && t.ty == elements::CPP_INCLUDE));
		assert!(toks.iter().any(|t| t.category == Category::Start && t.ty == elements::DECL_STMT));
	}

	#[test]
	fn function_declaration_without_body_is_function_decl() {
		let toks = parse_all("int f(int x);", Language::C);
		assert!(starts_and_ends_balance(&toks));
		assert!(toks.iter().any(|t| t.category == Category::Start && t.ty == elements::FUNCTION_DECL));
		assert!(!toks.iter().any(|t| t.category == Category::Start && t.ty == elements::FUNCTION));
	}

	#[test]
	fn declaration_with_initializer_has_init_element() {
		let toks = parse_all("int x = 1;", Language::C);
		assert!(starts_and_ends_balance(&toks));
		assert!(toks.iter().any(|t| t.category == Category::Start && t.ty == elements::INIT));
	}

	#[test]
	fn plain_declaration_nests_decl_inside_decl_stmt() {
		// Regression test: `decl_stmt`'s START is spliced in after `decl`'s
		// own START (innermost wrapper spliced first), so it must end up
		// both outside it in the token stream *and* closed after it.
		let src = "int x;";
		let toks = parse_all(src, Language::C);
		assert!(starts_and_ends_balance(&toks));
		assert_eq!(reconstruct_text(&toks), src);
		let decl_stmt_start = toks.iter().position(|t| t.category == Category::Start && t.ty == elements::DECL_STMT).unwrap();
		let decl_start = toks.iter().position(|t| t.category == Category::Start && t.ty == elements::DECL).unwrap();
		let decl_end = toks.iter().position(|t| t.category == Category::End && t.ty == elements::DECL).unwrap();
		let decl_stmt_end = toks.iter().position(|t| t.category == Category::End && t.ty == elements::DECL_STMT).unwrap();
		assert!(decl_stmt_start < decl_start, "decl_stmt must open before decl");
		assert!(decl_end < decl_stmt_end, "decl must close before decl_stmt");
	}

	#[test]
	fn if_else_nests_then_and_else() {
		let src = "if (x) { return 1; } else { return 2; }";
		let toks = parse_all(src, Language::C);
		assert!(starts_and_ends_balance(&toks));
		assert_eq!(reconstruct_text(&toks), src);
		assert!(toks.iter().any(|t| t.category == Category::Start && t.ty == elements::THEN));
		assert!(toks.iter().any(|t| t.category == Category::Start && t.ty == elements::ELSE));
	}

	#[test]
	fn function_call_in_expression_is_wrapped() {
		let toks = parse_all("f(1, 2);", Language::C);
		assert!(starts_and_ends_balance(&toks));
		assert!(toks.iter().any(|t| t.category == Category::Start && t.ty == elements::CALL));
		assert!(toks.iter().any(|t| t.category == Category::Start && t.ty == elements::ARGUMENT_LIST));
	}

	#[test]
	fn comment_is_wrapped_and_preserved() {
		let src = "// hello\nint x;";
		let toks = parse_all(src, Language::C);
		assert_eq!(reconstruct_text(&toks), src);
		assert!(toks.iter().any(|t| t.category == Category::Start && t.ty == elements::COMMENT));
	}

	#[test]
	fn class_with_body_is_wrapped_in_class_element() {
		let toks = parse_all("class Foo { int x; }", Language::Cpp);
		assert!(starts_and_ends_balance(&toks));
		assert!(toks.iter().any(|t| t.category == Category::Start && t.ty == elements::CLASS));
	}

	#[test]
	fn for_loop_has_for_control_and_incr() {
		let src = "for (i = 0; i < 1; i++) { x; }";
		let toks = parse_all(src, Language::C);
		assert!(starts_and_ends_balance(&toks));
		assert_eq!(reconstruct_text(&toks), src);
		assert!(toks.iter().any(|t| t.category == Category::Start && t.ty == elements::FOR_CONTROL));
		assert!(toks.iter().any(|t| t.category == Category::Start && t.ty == elements::INCR));
	}

	#[test]
	fn every_emitted_token_stream_is_non_empty_for_whitespace_only_input() {
		let toks = parse_all("   \n  ", Language::C);
		assert!(starts_and_ends_balance(&toks));
		assert_eq!(reconstruct_text(&toks), "   \n  ");
	}
}
