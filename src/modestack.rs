/*!
# Mode stack

Implements §4.4's `StateStack`: an ordered sequence of [`Mode`] frames with
the topmost as "current". Grounded almost one-to-one on
`original_source/src/parser/StateStack.hpp`'s `startNewMode`/`endCurrentMode`/
`popMode`, reimplemented over a plain `Vec<Mode>` (frame indices replace the
C++ struct's parent pointers, see [`crate::mode`]).
*/
use crate::elements::ElementTable;
use crate::error::InternalError;
use crate::mode::{Mode, ModeFlags};
use crate::token::TokenType;

/// Stack of parser [`Mode`]s. Invariant: never empty for the lifetime of a
/// translation (§3); the root `unit-start` mode is pushed by
/// [`ModeStack::new`] and is never popped by ordinary operation — only
/// [`ModeStack::end_all_modes`] at unit end drains it.
pub struct ModeStack {
	frames: Vec<Mode>,
}

impl ModeStack {
	/// Create a new stack with a single root frame (`unit-start`, per §4.3's
	/// state machine).
	pub fn new() -> ModeStack {
		ModeStack { frames: vec![Mode::new(ModeFlags::NONE, None, None)] }
	}

	/// Index of the current (topmost) frame.
	fn top_index(&self) -> usize {
		self.frames.len() - 1
	}

	pub fn current(&self) -> &Mode {
		self.frames.last().expect("mode stack is never empty")
	}

	pub fn current_mut(&mut self) -> &mut Mode {
		self.frames.last_mut().expect("mode stack is never empty")
	}

	pub fn depth(&self) -> usize {
		self.frames.len()
	}

	/// Push a new mode frame with the given flags on top of the stack.
	///
	/// `transparent` marks the new frame as transparent (visible to
	/// `in_transparent_mode` queries from deeper modes, per §3/§9's
	/// preprocessor-line example); if not transparent, the new frame's
	/// transparent parent is inherited from the current frame's own
	/// transparent parent (skipping over opaque frames), matching
	/// `original_source`'s "nearest transparent mode" lookup.
	pub fn push(&mut self, flags: ModeFlags, transparent: bool) {
		let parent = self.top_index();
		let transparent_parent = if transparent {
			Some(parent)
		} else {
			self.current().transparent_parent()
		};
		self.frames.push(Mode::new(flags, Some(parent), transparent_parent));
	}

	/// Pop the current frame. Returns every element that was still open in
	/// it, in LIFO order, so the caller (the parser) can emit matching `END`
	/// tokens before resuming in the parent frame.
	///
	/// # Errors
	///
	/// Returns [`InternalError::ModeStackUnderflow`] if only the root frame
	/// remains (§3: "attempting to pop the last frame is a fault").
	pub fn pop(&mut self) -> Result<Vec<TokenType>, InternalError> {
		if self.frames.len() <= 1 {
			return Err(InternalError::ModeStackUnderflow);
		}
		let mut top = self.frames.pop().expect("checked above");
		Ok(top.drain_open_elements().collect())
	}

	/// Assert the current mode carries `expected_flags` and pop it, closing
	/// every element still open in that mode in LIFO order (§4.4). After
	/// return, the now-current (parent) frame's own open-element stack is
	/// unchanged, per the invariant in §4.4.
	pub fn end_current_mode(&mut self, expected_flags: ModeFlags) -> Result<Vec<TokenType>, InternalError> {
		debug_assert!(
			self.current().in_mode(expected_flags) || expected_flags == ModeFlags::NONE,
			"end_current_mode called with mismatched expected flags",
		);
		self.pop()
	}

	/// Drain every remaining frame (including the root) at unit end,
	/// returning the element types that must be closed, in the order they
	/// should be emitted (innermost frame first, LIFO within each frame).
	/// This is the terminal `unit-end` transition of §4.3's state machine.
	pub fn end_all_modes(&mut self) -> Vec<TokenType> {
		let mut closes = Vec::new();
		while let Some(mut frame) = self.frames.pop() {
			closes.extend(frame.drain_open_elements());
		}
		self.frames.push(Mode::new(ModeFlags::NONE, None, None));
		closes
	}

	pub fn set_flags(&mut self, flags: ModeFlags) {
		self.current_mut().set_flags(flags);
	}

	pub fn clear_flags(&mut self, flags: ModeFlags) {
		self.current_mut().clear_flags(flags);
	}

	pub fn in_mode(&self, flags: ModeFlags) -> bool {
		self.current().in_mode(flags)
	}

	/// True if the current mode, or its nearest transparent ancestor (see
	/// §3's "transparent mode" glossary entry), carries `flags`.
	pub fn in_transparent_mode(&self, flags: ModeFlags) -> bool {
		if self.current().in_mode(flags) {
			return true;
		}
		let mut idx = self.current().transparent_parent();
		while let Some(i) = idx {
			let frame = &self.frames[i];
			if frame.in_mode(flags) {
				return true;
			}
			idx = frame.transparent_parent();
		}
		false
	}

	pub fn inc_paren(&mut self) {
		if self.current().in_mode(ModeFlags::STRUCTURAL_COUNTING) {
			self.current_mut().inc_paren();
		}
	}

	pub fn dec_paren(&mut self) -> Result<(), InternalError> {
		if self.current().in_mode(ModeFlags::STRUCTURAL_COUNTING) {
			self.current_mut().dec_paren().map_err(InternalError::CounterUnderflow)?;
		}
		Ok(())
	}

	pub fn inc_brace(&mut self) {
		if self.current().in_mode(ModeFlags::STRUCTURAL_COUNTING) {
			self.current_mut().inc_brace();
		}
	}

	pub fn dec_brace(&mut self) -> Result<(), InternalError> {
		if self.current().in_mode(ModeFlags::STRUCTURAL_COUNTING) {
			self.current_mut().dec_brace().map_err(InternalError::CounterUnderflow)?;
		}
		Ok(())
	}

	/// Push `ty` onto the current mode's open-element stack. Call this when
	/// emitting a `START` markup token for a construct that will need a
	/// matching `END`.
	pub fn push_open_element(&mut self, ty: TokenType) {
		self.current_mut().push_open_element(ty);
		let _ = ElementTable::try_lookup(ty);
	}

	/// Open-element count of the current mode, used to record a splice point
	/// alongside [`crate::tokenbuffer::TokenBuffer`]'s own mark (see
	/// [`crate::parser::StreamParser::mark`]).
	pub fn open_element_count(&self) -> usize {
		self.current().open_element_count()
	}

	/// Record `ty` as open at a specific depth rather than on top of the
	/// current mode's open-element stack (see [`Mode::insert_open_element`]).
	pub fn insert_open_element(&mut self, index: usize, ty: TokenType) {
		self.current_mut().insert_open_element(index, ty);
		let _ = ElementTable::try_lookup(ty);
	}

	/// Pop the current mode's innermost open element if it matches `ty`.
	/// Resolves §9 Open Question (c): a mismatch is a hard
	/// [`InternalError::ElementMismatch`], never silently swallowed.
	pub fn pop_open_element(&mut self, ty: TokenType) -> Result<(), InternalError> {
		match self.current_mut().pop_open_element_if(ty) {
			Ok(_) => Ok(()),
			Err(()) => Err(InternalError::ElementMismatch),
		}
	}
}

impl Default for ModeStack {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_stack_has_single_root_frame() {
		let s = ModeStack::new();
		assert_eq!(s.depth(), 1);
	}

	#[test]
	fn popping_last_frame_is_underflow() {
		let mut s = ModeStack::new();
		assert_eq!(s.pop(), Err(InternalError::ModeStackUnderflow));
	}

	#[test]
	fn push_pop_balances() {
		let mut s = ModeStack::new();
		s.push(ModeFlags::BLOCK_CONTENT, false);
		assert_eq!(s.depth(), 2);
		assert!(s.in_mode(ModeFlags::BLOCK_CONTENT));
		s.pop().unwrap();
		assert_eq!(s.depth(), 1);
	}

	#[test]
	fn end_current_mode_closes_open_elements_in_lifo_order() {
		let mut s = ModeStack::new();
		s.push(ModeFlags::BLOCK_CONTENT, false);
		s.push_open_element(1);
		s.push_open_element(2);
		let closed = s.end_current_mode(ModeFlags::BLOCK_CONTENT).unwrap();
		assert_eq!(closed, vec![2, 1]);
		assert_eq!(s.depth(), 1);
	}

	#[test]
	fn transparent_mode_is_visible_through_opaque_children() {
		let mut s = ModeStack::new();
		s.push(ModeFlags::PREPROCESSOR_LINE, true);
		s.push(ModeFlags::EXPECT_EXPRESSION, false);
		assert!(s.in_transparent_mode(ModeFlags::PREPROCESSOR_LINE));
		assert!(!s.in_mode(ModeFlags::PREPROCESSOR_LINE));
	}

	#[test]
	fn end_all_modes_drains_every_frame_and_leaves_one_root() {
		let mut s = ModeStack::new();
		s.push_open_element(1);
		s.push(ModeFlags::BLOCK_CONTENT, false);
		s.push_open_element(2);
		s.push(ModeFlags::EXPECT_EXPRESSION, false);
		s.push_open_element(3);
		let closed = s.end_all_modes();
		assert_eq!(closed, vec![3, 2, 1]);
		assert_eq!(s.depth(), 1);
	}

	#[test]
	fn counters_only_track_when_structural_counting_enabled() {
		let mut s = ModeStack::new();
		s.inc_paren();
		assert_eq!(s.current().paren_count(), 0);
		s.push(ModeFlags::STRUCTURAL_COUNTING, false);
		s.inc_paren();
		assert_eq!(s.current().paren_count(), 1);
	}

	#[test]
	fn element_mismatch_is_reported_not_swallowed() {
		let mut s = ModeStack::new();
		s.push_open_element(1);
		assert_eq!(s.pop_open_element(2), Err(InternalError::ElementMismatch));
	}
}
