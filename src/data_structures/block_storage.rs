/// Location of a record inside a [BlockStorage].
#[derive(Default, Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub struct StorageEntry {
	pub block: u32,
	pub index: u32,
}

impl StorageEntry {
	pub const INVALID: Self = Self {
		block: u32::MAX,
		index: u32::MAX,
	};
}

/// A record that was moved by a compacting [remove](BlockStorage::remove).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Relocation {
	pub from: StorageEntry,
	pub to: StorageEntry,
}

/// The outcome of [BlockStorage::remove].
#[derive(Debug)]
pub struct Removed<T> {
	pub value: T,
	/// At most one other record moves per removal, and only in compact storage.
	pub relocation: Option<Relocation>,
}

struct Block<T> {
	records: Vec<Option<T>>,
}

impl<T> Block<T> {
	fn new(capacity: usize) -> Self {
		Self {
			records: Vec::with_capacity(capacity),
		}
	}
}

/// Homogeneous records stored in fixed-capacity blocks.
///
/// Blocks are only ever appended; a block's buffer is allocated once with its final capacity
/// and never reallocated, so records don't move unless storage is compact.
///
/// * Compact storage keeps all records in a dense prefix. Removing a record moves the last
///   record into the hole.
/// * Non-compact storage leaves a tombstone behind. Tombstones are reused by later insertions
///   and skipped during iteration.
pub struct BlockStorage<T> {
	blocks: Vec<Block<T>>,
	block_capacity: usize,
	compact: bool,
	len: usize,
	count: usize,
	free: Vec<StorageEntry>,
}

impl<T> BlockStorage<T> {
	/// Create an empty storage.
	///
	/// # Arguments
	/// * `block_capacity` - The number of records per block
	/// * `compact` - Whether removals swap the last record into the freed position
	pub fn new(block_capacity: usize, compact: bool) -> Self {
		assert!(block_capacity > 0, "Block capacity must be greater than zero");
		Self {
			blocks: Vec::new(),
			block_capacity,
			compact,
			len: 0,
			count: 0,
			free: Vec::new(),
		}
	}

	/// Store a default-initialized record.
	pub fn allocate(&mut self) -> (StorageEntry, &mut T)
	where
		T: Default,
	{
		self.insert(T::default())
	}

	/// Store `value` in the first reusable position, or append it.
	pub fn insert(&mut self, value: T) -> (StorageEntry, &mut T) {
		let entry = match self.free.pop() {
			Some(entry) => entry,
			None => self.push_position(),
		};

		self.count += 1;
		let slot = &mut self.blocks[entry.block as usize].records[entry.index as usize];
		debug_assert!(slot.is_none(), "Storage position is already occupied");
		(entry, slot.insert(value))
	}

	/// Remove the record at `entry`.
	/// Returns `None` if the position is empty.
	pub fn remove(&mut self, entry: StorageEntry) -> Option<Removed<T>> {
		let value = self.slot_mut(entry)?.take()?;
		self.count -= 1;

		if !self.compact {
			self.free.push(entry);
			return Some(Removed { value, relocation: None });
		}

		let last = self.entry_at(self.len - 1);
		let moved = self.blocks[last.block as usize].records.pop().flatten();
		self.len -= 1;

		let relocation = match moved {
			Some(moved) if last != entry => {
				self.blocks[entry.block as usize].records[entry.index as usize] = Some(moved);
				Some(Relocation { from: last, to: entry })
			},
			_ => None,
		};

		Some(Removed { value, relocation })
	}

	pub fn get(&self, entry: StorageEntry) -> Option<&T> {
		self.blocks.get(entry.block as usize)?.records.get(entry.index as usize)?.as_ref()
	}

	pub fn get_mut(&mut self, entry: StorageEntry) -> Option<&mut T> {
		self.slot_mut(entry)?.as_mut()
	}

	/// Iterate over all records in physical order.
	pub fn iter(&self) -> Iter<'_, T> {
		Iter {
			blocks: self.blocks.iter(),
			records: <&[Option<T>]>::default().iter(),
		}
	}

	/// Mutably iterate over all records in physical order.
	pub fn iter_mut(&mut self) -> IterMut<'_, T> {
		IterMut {
			blocks: self.blocks.iter_mut(),
			records: <&mut [Option<T>]>::default().iter_mut(),
		}
	}

	/// Iterate over the records stored at positions `[start, start + count)`.
	pub fn iter_range(&self, start: usize, count: usize) -> impl Iterator<Item = &T> + '_ {
		let end = usize::min(start.saturating_add(count), self.len);
		(start..end).filter_map(move |position| self.get(self.entry_at(position)))
	}

	/// Mutable access to the records stored at positions `[start, start + count)`.
	pub fn range_mut(&mut self, start: usize, count: usize) -> BatchMut<'_, T> {
		let end = usize::min(start.saturating_add(count), self.len);
		let size = usize::max(end.saturating_sub(start), 1);
		self.carve(start, end, size, Split::Positions).pop().unwrap_or_else(|| BatchMut::new(start))
	}

	/// Split the stored records into `ceil(count / granularity)` disjoint batches of
	/// `granularity` records each; the last batch may hold fewer.
	/// Tombstones don't count towards a batch. A granularity of 0 yields a single batch.
	pub fn batches_mut(&mut self, granularity: usize) -> Vec<BatchMut<'_, T>> {
		let size = match granularity {
			0 => usize::max(self.count, 1),
			n => n,
		};
		let len = self.len;
		self.carve(0, len, size, Split::Records)
	}

	/// Number of positions in use, including tombstones of non-compact storage.
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.count == 0
	}

	/// Number of stored records.
	pub fn count(&self) -> usize {
		self.count
	}

	pub fn block_count(&self) -> usize {
		self.blocks.len()
	}

	pub fn block_capacity(&self) -> usize {
		self.block_capacity
	}

	pub fn is_compact(&self) -> bool {
		self.compact
	}

	/// Physical position of `entry`.
	pub fn position_of(&self, entry: StorageEntry) -> usize {
		entry.block as usize * self.block_capacity + entry.index as usize
	}

	/// The entry addressing physical position `position`.
	pub fn entry_at(&self, position: usize) -> StorageEntry {
		StorageEntry {
			block: (position / self.block_capacity) as u32,
			index: (position % self.block_capacity) as u32,
		}
	}

	fn slot_mut(&mut self, entry: StorageEntry) -> Option<&mut Option<T>> {
		self.blocks.get_mut(entry.block as usize)?.records.get_mut(entry.index as usize)
	}

	fn push_position(&mut self) -> StorageEntry {
		let entry = self.entry_at(self.len);
		if entry.block as usize == self.blocks.len() {
			self.blocks.push(Block::new(self.block_capacity));
		}

		let records = &mut self.blocks[entry.block as usize].records;
		debug_assert_eq!(records.len(), entry.index as usize);
		debug_assert!(records.len() < records.capacity(), "Blocks must never reallocate");
		records.push(None);

		self.len += 1;
		entry
	}

	fn carve(&mut self, start: usize, end: usize, size: usize, split: Split) -> Vec<BatchMut<'_, T>> {
		debug_assert!(size > 0);

		let mut batches = Vec::new();
		if start >= end {
			return batches;
		}

		let mut current = BatchMut::new(start);
		let mut filled = 0;
		let mut position = 0;

		for block in self.blocks.iter_mut() {
			let block_start = position;
			position += block.records.len();

			if position <= start {
				continue;
			}
			if block_start >= end {
				break;
			}

			let from = start.saturating_sub(block_start);
			let to = usize::min(end - block_start, block.records.len());
			let mut offset = block_start + from;
			let mut rest = &mut block.records[from..to];

			while !rest.is_empty() {
				let (take, records) = match split {
					Split::Positions => {
						let take = usize::min(size - filled, rest.len());
						(take, rest[..take].iter().filter(|record| record.is_some()).count())
					},
					Split::Records => prefix_holding(rest, size - filled),
				};

				let (head, tail) = std::mem::take(&mut rest).split_at_mut(take);
				current.pieces.push(head);
				current.count += records;
				filled += match split {
					Split::Positions => take,
					Split::Records => records,
				};
				offset += take;
				rest = tail;

				if filled == size {
					batches.push(std::mem::replace(&mut current, BatchMut::new(offset)));
					filled = 0;
				}
			}
		}

		if filled > 0 {
			batches.push(current);
		}

		batches
	}
}

#[derive(Copy, Clone)]
enum Split {
	/// Every batch spans `size` positions.
	Positions,
	/// Every batch holds `size` records.
	Records,
}

/// Length of the shortest prefix of `records` holding `wanted` records,
/// and the number of records it actually holds.
fn prefix_holding<T>(records: &[Option<T>], wanted: usize) -> (usize, usize) {
	let mut found = 0;
	for (i, record) in records.iter().enumerate() {
		if record.is_some() {
			found += 1;
			if found == wanted {
				return (i + 1, found);
			}
		}
	}
	(records.len(), found)
}

/// Mutable access to a contiguous range of storage positions.
///
/// Batches returned by [BlockStorage::batches_mut] never overlap and can be processed on
/// different threads.
pub struct BatchMut<'l, T> {
	start: usize,
	count: usize,
	pieces: Vec<&'l mut [Option<T>]>,
}

impl<'l, T> BatchMut<'l, T> {
	fn new(start: usize) -> Self {
		Self {
			start,
			count: 0,
			pieces: Vec::new(),
		}
	}

	/// First position covered by the batch.
	pub fn start(&self) -> usize {
		self.start
	}

	/// Number of records in the batch. Tombstones are not counted.
	pub fn count(&self) -> usize {
		self.count
	}

	pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
		self.pieces.iter().flat_map(|piece| piece.iter()).filter_map(Option::as_ref)
	}

	pub fn iter_mut(&mut self) -> BatchIterMut<'_, 'l, T> {
		BatchIterMut {
			pieces: self.pieces.iter_mut(),
			records: <&mut [Option<T>]>::default().iter_mut(),
		}
	}
}

/// Mutably iterates over the records of a [BatchMut].
pub struct BatchIterMut<'a, 'l, T> {
	pieces: std::slice::IterMut<'a, &'l mut [Option<T>]>,
	records: std::slice::IterMut<'a, Option<T>>,
}

impl<'a, 'l, T> Iterator for BatchIterMut<'a, 'l, T> {
	type Item = &'a mut T;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			match self.records.next() {
				Some(Some(record)) => return Some(record),
				Some(None) => continue,
				None => self.records = self.pieces.next()?.iter_mut(),
			}
		}
	}
}

/// Iterates over the records of a [BlockStorage].
pub struct Iter<'l, T> {
	blocks: std::slice::Iter<'l, Block<T>>,
	records: std::slice::Iter<'l, Option<T>>,
}

impl<'l, T> Iterator for Iter<'l, T> {
	type Item = &'l T;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			match self.records.next() {
				Some(Some(record)) => return Some(record),
				Some(None) => continue,
				None => self.records = self.blocks.next()?.records.iter(),
			}
		}
	}
}

/// Mutably iterates over the records of a [BlockStorage].
pub struct IterMut<'l, T> {
	blocks: std::slice::IterMut<'l, Block<T>>,
	records: std::slice::IterMut<'l, Option<T>>,
}

impl<'l, T> Iterator for IterMut<'l, T> {
	type Item = &'l mut T;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			match self.records.next() {
				Some(Some(record)) => return Some(record),
				Some(None) => continue,
				None => self.records = self.blocks.next()?.records.iter_mut(),
			}
		}
	}
}
