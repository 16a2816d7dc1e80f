/*!
# Parser modes

A [`Mode`] is a single frame on the [`crate::modestack::ModeStack`]: a set of
behavior flags, an open-element stack awaiting closure within this mode, and
three counters (parenthesis depth, brace depth, type-token count), per §3.

Modes differ only in flags and counters, never in type (§9 design note "mode
flags vs inheritance"): there is a single `Mode` struct, not a hierarchy of
mode subclasses. Parent and "nearest transparent parent" links are stored as
indices into the owning [`crate::modestack::ModeStack`]'s `Vec`, rather than
as pointers, since Rust ownership makes a stack of self-referential frames
awkward; `original_source`'s `StateStack` uses raw pointers for the same
links.
*/
use crate::token::TokenType;

/// Bit-union of mode behavior flags, drawn from the fixed vocabulary named in
/// §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeFlags(u32);

impl ModeFlags {
	pub const NONE: ModeFlags = ModeFlags(0);
	pub const EXPECT_EXPRESSION: ModeFlags = ModeFlags(1 << 0);
	pub const INSIDE_PARAMETER_LIST: ModeFlags = ModeFlags(1 << 1);
	pub const STATEMENT_START: ModeFlags = ModeFlags(1 << 2);
	pub const BLOCK_CONTENT: ModeFlags = ModeFlags(1 << 3);
	pub const TYPEDEF: ModeFlags = ModeFlags(1 << 4);
	pub const TEMPLATE_ARGS: ModeFlags = ModeFlags(1 << 5);
	pub const PREPROCESSOR_LINE: ModeFlags = ModeFlags(1 << 6);
	pub const INSIDE_ARGUMENT_LIST: ModeFlags = ModeFlags(1 << 7);
	pub const CLASS_BODY: ModeFlags = ModeFlags(1 << 8);
	pub const CONDITION: ModeFlags = ModeFlags(1 << 9);
	pub const STRUCTURAL_COUNTING: ModeFlags = ModeFlags(1 << 10);

	pub const fn empty() -> ModeFlags {
		ModeFlags::NONE
	}

	pub const fn contains(self, other: ModeFlags) -> bool {
		(self.0 & other.0) == other.0
	}

	pub const fn union(self, other: ModeFlags) -> ModeFlags {
		ModeFlags(self.0 | other.0)
	}

	pub const fn minus(self, other: ModeFlags) -> ModeFlags {
		ModeFlags(self.0 & !other.0)
	}
}

impl std::ops::BitOr for ModeFlags {
	type Output = ModeFlags;

	fn bitor(self, rhs: ModeFlags) -> ModeFlags {
		self.union(rhs)
	}
}

/// One frame of the parser's mode stack, per §3.
///
/// `parent` and `transparent_parent` are indices into the owning
/// [`crate::modestack::ModeStack`]'s frame vector rather than pointers or
/// owned references: a frame never outlives its stack, and Rust's aliasing
/// rules make a genuine parent pointer awkward for a structure that is
/// mutated through `&mut` as often as this one is.
#[derive(Debug, Clone)]
pub struct Mode {
	flags: ModeFlags,
	open_elements: Vec<TokenType>,
	paren_count: u32,
	brace_count: u32,
	type_count: u32,
	parent: Option<usize>,
	transparent_parent: Option<usize>,
}

impl Mode {
	/// Construct a new mode frame with the given flags, linked to its parent
	/// frame index (`None` for the root `unit-start` mode).
	pub fn new(flags: ModeFlags, parent: Option<usize>, transparent_parent: Option<usize>) -> Mode {
		Mode {
			flags,
			open_elements: Vec::new(),
			paren_count: 0,
			brace_count: 0,
			type_count: 0,
			parent,
			transparent_parent,
		}
	}

	pub fn flags(&self) -> ModeFlags {
		self.flags
	}

	pub fn set_flags(&mut self, flags: ModeFlags) {
		self.flags = self.flags.union(flags);
	}

	pub fn clear_flags(&mut self, flags: ModeFlags) {
		self.flags = self.flags.minus(flags);
	}

	pub fn in_mode(&self, flags: ModeFlags) -> bool {
		self.flags.contains(flags)
	}

	pub fn parent(&self) -> Option<usize> {
		self.parent
	}

	pub fn transparent_parent(&self) -> Option<usize> {
		self.transparent_parent
	}

	pub fn paren_count(&self) -> u32 {
		self.paren_count
	}

	pub fn brace_count(&self) -> u32 {
		self.brace_count
	}

	pub fn type_count(&self) -> u32 {
		self.type_count
	}

	pub fn inc_paren(&mut self) {
		self.paren_count += 1;
	}

	pub fn dec_paren(&mut self) -> Result<(), &'static str> {
		if self.paren_count == 0 {
			return Err("parenthesis");
		}
		self.paren_count -= 1;
		Ok(())
	}

	pub fn inc_brace(&mut self) {
		self.brace_count += 1;
	}

	pub fn dec_brace(&mut self) -> Result<(), &'static str> {
		if self.brace_count == 0 {
			return Err("brace");
		}
		self.brace_count -= 1;
		Ok(())
	}

	pub fn inc_type_count(&mut self) {
		self.type_count += 1;
	}

	pub fn reset_type_count(&mut self) {
		self.type_count = 0;
	}

	/// Record that an element of the given type was opened and is awaiting
	/// its matching close within this mode.
	pub fn push_open_element(&mut self, ty: TokenType) {
		self.open_elements.push(ty);
	}

	/// Record an open element at a specific depth in this mode's
	/// open-element stack rather than appending it on top. Used when a
	/// `START` token was spliced retroactively behind one or more other
	/// just-spliced `START` tokens (§9 "retroactive markup via TokenBuffer"):
	/// the element that ends up *outermost* in the token stream must end up
	/// *below* the others on this stack too, so it is the last of the group
	/// to be closed, even though it was the last one pushed in call order.
	pub fn insert_open_element(&mut self, index: usize, ty: TokenType) {
		self.open_elements.insert(index, ty);
	}

	/// Pop the innermost still-open element of this mode, if its type
	/// matches `ty`. Returns `Ok(Some(()))` on a match, `Ok(None)` if the
	/// mode has no open elements (nothing to close), and `Err(())` on a
	/// genuine mismatch (resolves §9 Open Question (c): never silently
	/// swallowed).
	pub fn pop_open_element_if(&mut self, ty: TokenType) -> Result<bool, ()> {
		match self.open_elements.last() {
			None => Ok(false),
			Some(top) if *top == ty => {
				self.open_elements.pop();
				Ok(true)
			}
			Some(_) => Err(()),
		}
	}

	/// Drain every still-open element of this mode in LIFO order, for use by
	/// `end_current_mode`/unit-end forced closure.
	pub fn drain_open_elements(&mut self) -> impl Iterator<Item = TokenType> + '_ {
		std::iter::from_fn(move || self.open_elements.pop())
	}

	pub fn open_element_count(&self) -> usize {
		self.open_elements.len()
	}
}
