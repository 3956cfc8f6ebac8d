use std::iter::repeat;

const BITS: usize = 64;

/// A dynamically sized bit-field.
#[derive(Default, Clone, Debug)]
pub struct BitField {
	values: Vec<u64>,
	ones: usize,
}

impl BitField {
	/// Create a new [BitField].
	pub fn new() -> Self {
		Self::default()
	}

	/// Get the value of the bit at index `i`.
	/// Bits outside of the current capacity read as `false`.
	#[inline(always)]
	pub fn get(&self, i: usize) -> bool {
		let (position, shift) = Self::pos_shift(i);
		match self.values.get(position) {
			Some(value) => value & (1 << shift) != 0,
			None => false,
		}
	}

	/// Set the value of the bit at index `i`, growing the [BitField] if needed.
	/// Returns the previous value.
	#[inline(always)]
	pub fn set(&mut self, i: usize, value: bool) -> bool {
		let (position, shift) = Self::pos_shift(i);
		if position >= self.values.len() {
			if !value {
				return false;
			}
			self.ensure_capacity(i + 1);
		}

		let word = &mut self.values[position];
		let bit = 1 << shift;
		let previous = *word & bit != 0;

		match (previous, value) {
			(false, true) => {
				*word |= bit;
				self.ones += 1;
			},
			(true, false) => {
				*word &= !bit;
				self.ones -= 1;
			},
			_ => {},
		}

		previous
	}

	/// Number of set bits.
	#[inline(always)]
	pub fn count_ones(&self) -> usize {
		self.ones
	}

	/// Set the minimum capacity of the [BitField].
	/// # Arguments
	/// * `capacity` - A usize representing the container's minimum capacity in bits
	fn ensure_capacity(&mut self, capacity: usize) {
		let words = (capacity + BITS - 1) / BITS;
		if self.values.len() < words {
			let count = words - self.values.len();
			self.values.extend(repeat(0).take(count));
		}
	}

	#[inline(always)]
	fn pos_shift(a: usize) -> (usize, usize) {
		(a / BITS, a % BITS)
	}
}
