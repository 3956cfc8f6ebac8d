/// The stages of a world update, executed in declaration order.
#[repr(u8)]
#[derive(Default, Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Phase {
	/// Synchronous work that must happen before anything runs in parallel.
	#[default]
	PreAsync = 0,
	/// Batched work spread over the worker pool.
	Async = 1,
	/// Synchronous work consuming the results of the async phase.
	PostAsync = 2,
	/// Runs after transforms were propagated.
	PostTransform = 3,
}

impl Phase {
	pub const COUNT: usize = 4;
	pub const ALL: [Phase; Phase::COUNT] = [Phase::PreAsync, Phase::Async, Phase::PostAsync, Phase::PostTransform];

	#[inline(always)]
	pub const fn index(self) -> usize {
		self as usize
	}

	#[inline(always)]
	pub const fn is_async(self) -> bool {
		matches!(self, Phase::Async)
	}
}
