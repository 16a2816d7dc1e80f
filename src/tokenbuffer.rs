/*!
# Token look-back buffer

Bounded FIFO of [`Token`]s with random-access look-back, per §4.5 and §9's
"retroactive markup via TokenBuffer" design note. Shaped after
`rxml/src/bufq.rs`'s `BufferQueue` (ring-buffer-over-`VecDeque`, push/consume/
`len` API), adapted from byte slices to [`Token`]s and extended with the
offset-addressed mutation operations (`replace_at`/`insert_at`/`delete_at`)
the parser needs to retroactively mark up a construct it could not classify
when the token was first produced.
*/
use std::collections::VecDeque;

use crate::token::Token;

/// Ring buffer of capacity *k* tokens with LIFO look-back (§4.5).
///
/// Tokens enter via [`TokenBuffer::push`] and leave via
/// [`TokenBuffer::consume_oldest`] in FIFO order; while a token is still in
/// the window it may be inspected with [`TokenBuffer::peek_back`] or mutated
/// with [`TokenBuffer::replace_at`]/[`TokenBuffer::insert_at`]/
/// [`TokenBuffer::delete_at`]. Once a token has been handed to the caller by
/// `consume_oldest`, it is immutable (§4.5 invariant): there is no operation
/// to reach back into already-consumed output.
pub struct TokenBuffer {
	capacity: usize,
	window: VecDeque<Token>,
}

impl TokenBuffer {
	/// Create a new buffer with the given look-back window capacity
	/// (§4.3/§9 suggest *k* ≈ 64).
	pub fn new(capacity: usize) -> TokenBuffer {
		TokenBuffer { capacity: capacity.max(1), window: VecDeque::with_capacity(capacity) }
	}

	pub fn len(&self) -> usize {
		self.window.len()
	}

	pub fn is_empty(&self) -> bool {
		self.window.is_empty()
	}

	/// Append a newly produced token to the back of the window.
	pub fn push(&mut self, token: Token) {
		self.window.push_back(token);
	}

	/// Remove and return the oldest token if the window is at or over
	/// capacity, for delivery to [`crate::writer::Output`]. Returns `None`
	/// while there is still room to hold more tokens for possible
	/// retroactive marking.
	pub fn consume_oldest(&mut self) -> Option<Token> {
		if self.window.len() > self.capacity {
			self.window.pop_front()
		} else {
			None
		}
	}

	/// Force-drain the oldest token regardless of capacity, used at
	/// unit/translation end to flush everything remaining in the window.
	pub fn force_consume_oldest(&mut self) -> Option<Token> {
		self.window.pop_front()
	}

	/// Peek `n` tokens back from the most recently pushed token (`n == 0` is
	/// the most recent token).
	pub fn peek_back(&self, n: usize) -> Option<&Token> {
		let len = self.window.len();
		if n >= len {
			return None;
		}
		self.window.get(len - 1 - n)
	}

	/// Replace the token `n` positions back from the most recent with a new
	/// one, e.g. to retype a previously-emitted identifier as a type name.
	pub fn replace_at(&mut self, n: usize, token: Token) -> bool {
		let len = self.window.len();
		if n >= len {
			return false;
		}
		self.window[len - 1 - n] = token;
		true
	}

	/// Insert a token `n` positions back from the most recent, shifting
	/// later tokens further back, e.g. to splice a `START` marker in front
	/// of an already-buffered identifier.
	pub fn insert_at(&mut self, n: usize, token: Token) -> bool {
		let len = self.window.len();
		if n > len {
			return false;
		}
		self.window.insert(len - n, token);
		true
	}

	/// Delete the token `n` positions back from the most recent.
	pub fn delete_at(&mut self, n: usize) -> Option<Token> {
		let len = self.window.len();
		if n >= len {
			return None;
		}
		self.window.remove(len - 1 - n)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::token::Position;

	fn lit(text: &str) -> Token {
		Token::literal(0, Position::new(1, 1), text.to_string())
	}

	#[test]
	fn push_then_consume_is_fifo_once_over_capacity() {
		let mut b = TokenBuffer::new(2);
		b.push(lit("a"));
		b.push(lit("b"));
		assert!(b.consume_oldest().is_none(), "not yet over capacity");
		b.push(lit("c"));
		let t = b.consume_oldest().unwrap();
		assert_eq!(t.text, "a");
	}

	#[test]
	fn peek_back_indexes_from_most_recent() {
		let mut b = TokenBuffer::new(8);
		b.push(lit("a"));
		b.push(lit("b"));
		b.push(lit("c"));
		assert_eq!(b.peek_back(0).unwrap().text, "c");
		assert_eq!(b.peek_back(1).unwrap().text, "b");
		assert_eq!(b.peek_back(2).unwrap().text, "a");
		assert!(b.peek_back(3).is_none());
	}

	#[test]
	fn replace_at_retypes_a_buffered_token() {
		let mut b = TokenBuffer::new(8);
		b.push(lit("a"));
		b.push(lit("b"));
		assert!(b.replace_at(1, lit("A")));
		assert_eq!(b.peek_back(1).unwrap().text, "A");
	}

	#[test]
	fn insert_and_delete_shift_the_window() {
		let mut b = TokenBuffer::new(8);
		b.push(lit("a"));
		b.push(lit("c"));
		assert!(b.insert_at(1, lit("b")));
		let all: Vec<_> = (0..3).map(|n| b.peek_back(2 - n).unwrap().text.clone()).collect();
		assert_eq!(all, vec!["a", "b", "c"]);
		let removed = b.delete_at(1).unwrap();
		assert_eq!(removed.text, "b");
	}

	#[test]
	fn force_consume_drains_regardless_of_capacity() {
		let mut b = TokenBuffer::new(8);
		b.push(lit("a"));
		assert!(b.consume_oldest().is_none());
		assert_eq!(b.force_consume_oldest().unwrap().text, "a");
		assert!(b.force_consume_oldest().is_none());
	}
}
