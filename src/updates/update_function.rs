use crate::components::{Component, ComponentManager, ComponentManagerBase, ComponentRecord, ComponentTypeId, SimpleUpdate};
use crate::data_structures::{BatchIterMut, BatchMut};
use crate::error::{Result, WorldError};
use crate::updates::Phase;
use std::hash::{Hash, Hasher};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::any::TypeId;
use std::fmt;

/// Identifies an update function by its owning component type and its name.
#[derive(Copy, Clone)]
pub struct UpdateFunctionId {
	owner: TypeId,
	owner_name: &'static str,
	name: &'static str,
}

impl UpdateFunctionId {
	/// The id of the function `name` owned by the manager of `C`.
	pub fn of<C: Component>(name: &'static str) -> Self {
		Self {
			owner: TypeId::of::<C>(),
			owner_name: std::any::type_name::<C>(),
			name,
		}
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Type name of the owning component.
	pub fn owner_name(&self) -> &'static str {
		self.owner_name
	}
}

impl PartialEq for UpdateFunctionId {
	fn eq(&self, other: &Self) -> bool {
		self.owner == other.owner && self.name == other.name
	}
}

impl Eq for UpdateFunctionId {}

impl Hash for UpdateFunctionId {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.owner.hash(state);
		self.name.hash(state);
	}
}

impl fmt::Debug for UpdateFunctionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "UpdateFunctionId({}::{})", self.owner_name, self.name)
	}
}

impl fmt::Display for UpdateFunctionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}::{}", self.owner_name, self.name)
	}
}

/// Execution state handed to update functions.
#[derive(Copy, Clone, Debug)]
pub struct UpdateContext<'l> {
	phase: Phase,
	tick: u64,
	simulation_enabled: bool,
	start: usize,
	count: usize,
	granularity: u16,
	pool: Option<&'l ThreadPool>,
}

impl<'l> UpdateContext<'l> {
	pub(crate) fn new(phase: Phase, tick: u64, simulation_enabled: bool, pool: Option<&'l ThreadPool>) -> Self {
		Self {
			phase,
			tick,
			simulation_enabled,
			start: 0,
			count: 0,
			granularity: 0,
			pool,
		}
	}

	pub(crate) fn with_range(mut self, start: usize, count: usize) -> Self {
		self.start = start;
		self.count = count;
		self
	}

	pub(crate) fn with_granularity(mut self, granularity: u16) -> Self {
		self.granularity = granularity;
		self
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	/// Number of completed world updates.
	pub fn tick(&self) -> u64 {
		self.tick
	}

	pub fn is_simulation_enabled(&self) -> bool {
		self.simulation_enabled
	}

	/// First storage position the function is expected to process.
	pub fn start(&self) -> usize {
		self.start
	}

	/// Number of storage positions the function is expected to process.
	pub fn count(&self) -> usize {
		self.count
	}

	pub fn granularity(&self) -> u16 {
		self.granularity
	}

	/// Run `op` inside the world's worker pool, or on the global pool if the world has none.
	pub fn install<OP, R>(&self, op: OP) -> R
	where
		OP: FnOnce() -> R + Send,
		R: Send,
	{
		match self.pool {
			Some(pool) => pool.install(op),
			None => op(),
		}
	}
}

/// Mutable access to the components stored in a range of positions.
/// Deleted components are skipped.
pub struct UpdateBatch<'l, C> {
	inner: BatchMut<'l, ComponentRecord<C>>,
}

impl<'l, C> UpdateBatch<'l, C> {
	pub(crate) fn new(inner: BatchMut<'l, ComponentRecord<C>>) -> Self {
		Self { inner }
	}

	/// First storage position covered by the batch.
	pub fn start(&self) -> usize {
		self.inner.start()
	}

	/// Number of stored components in the batch, including ones deleted during the current phase.
	pub fn count(&self) -> usize {
		self.inner.count()
	}

	pub fn iter(&self) -> impl Iterator<Item = &C> + '_ {
		self.inner.iter().filter(|record| record.is_live()).map(|record| &record.value)
	}

	pub fn iter_mut(&mut self) -> UpdateBatchIterMut<'_, 'l, C> {
		UpdateBatchIterMut {
			records: self.inner.iter_mut(),
		}
	}
}

/// Mutably iterates over the live components of an [UpdateBatch].
pub struct UpdateBatchIterMut<'a, 'l, C> {
	records: BatchIterMut<'a, 'l, ComponentRecord<C>>,
}

impl<'a, 'l, C> Iterator for UpdateBatchIterMut<'a, 'l, C> {
	type Item = &'a mut C;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			let record = self.records.next()?;
			if record.is_live() {
				return Some(&mut record.value);
			}
		}
	}
}

pub(crate) type UpdateCallback =
	Box<dyn FnMut(&mut dyn ComponentManagerBase, &UpdateContext<'_>) -> Result<()> + Send>;

/// Describes an update function before it is registered with the
/// [UpdateScheduler](crate::updates::UpdateScheduler).
pub struct UpdateFunctionDesc {
	pub(crate) id: UpdateFunctionId,
	pub(crate) owner: ComponentTypeId,
	pub(crate) phase: Phase,
	pub(crate) depends_on: Vec<UpdateFunctionId>,
	pub(crate) only_when_simulating: bool,
	pub(crate) granularity: u16,
	pub(crate) batched: bool,
	pub(crate) callback: UpdateCallback,
}

impl UpdateFunctionDesc {
	/// A synchronous function receiving the whole manager.
	/// Runs in [Phase::PreAsync] unless [in_phase](Self::in_phase) says otherwise.
	pub fn new<C, F>(name: &'static str, mut function: F) -> Self
	where
		C: Component,
		F: FnMut(&mut ComponentManager<C>, &UpdateContext<'_>) + Send + 'static,
	{
		let callback: UpdateCallback = Box::new(move |manager, ctx| {
			let manager = downcast::<C>(manager)?;
			let ctx = ctx.with_range(0, manager.storage_len());
			function(manager, &ctx);
			Ok(())
		});

		Self::with_callback::<C>(name, Phase::PreAsync, false, callback)
	}

	/// A function processing disjoint batches of components in parallel.
	/// Always runs in [Phase::Async]; the batch size is set with [with_granularity](Self::with_granularity).
	pub fn batched<C, F>(name: &'static str, function: F) -> Self
	where
		C: Component,
		F: Fn(UpdateBatch<'_, C>) + Send + Sync + 'static,
	{
		let callback: UpdateCallback = Box::new(move |manager, ctx| {
			let manager = downcast::<C>(manager)?;
			let batches = manager.batches_mut(ctx.granularity() as usize);
			let function = &function;
			ctx.install(|| batches.into_par_iter().for_each(|batch| function(batch)));
			Ok(())
		});

		Self::with_callback::<C>(name, Phase::Async, true, callback)
	}

	/// Calls [SimpleUpdate::update] on every live component of `C`.
	pub fn simple<C: SimpleUpdate>() -> Self {
		Self::new::<C, _>("simple_update", |manager: &mut ComponentManager<C>, ctx: &UpdateContext<'_>| {
			let mut batch = manager.components_in_range_mut(ctx.start(), ctx.count());
			for component in batch.iter_mut() {
				component.update(ctx);
			}
		})
		.only_when_simulating(C::ONLY_WHEN_SIMULATING)
	}

	fn with_callback<C: Component>(name: &'static str, phase: Phase, batched: bool, callback: UpdateCallback) -> Self {
		Self {
			id: UpdateFunctionId::of::<C>(name),
			owner: C::component_type_id(),
			phase,
			depends_on: Vec::new(),
			only_when_simulating: false,
			granularity: 0,
			batched,
			callback,
		}
	}

	pub fn in_phase(mut self, phase: Phase) -> Self {
		self.phase = phase;
		self
	}

	/// Run after `dependency`, which must be registered in the same or an earlier phase.
	pub fn depends_on(mut self, dependency: UpdateFunctionId) -> Self {
		if !self.depends_on.contains(&dependency) {
			self.depends_on.push(dependency);
		}
		self
	}

	pub fn only_when_simulating(mut self, only_when_simulating: bool) -> Self {
		self.only_when_simulating = only_when_simulating;
		self
	}

	/// Number of components per batch. Only batched functions may set it.
	pub fn with_granularity(mut self, granularity: u16) -> Self {
		self.granularity = granularity;
		self
	}

	pub fn id(&self) -> UpdateFunctionId {
		self.id
	}

	/// Type id of the owning manager.
	pub fn owner(&self) -> ComponentTypeId {
		self.owner
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn dependencies(&self) -> &[UpdateFunctionId] {
		&self.depends_on
	}

	pub fn is_only_when_simulating(&self) -> bool {
		self.only_when_simulating
	}

	pub fn granularity(&self) -> u16 {
		self.granularity
	}

	pub fn is_batched(&self) -> bool {
		self.batched
	}

	pub(crate) fn validate(&self) -> Result<()> {
		let reason = if self.granularity != 0 && !self.batched {
			"synchronous functions must have a granularity of 0"
		} else if self.batched && !self.phase.is_async() {
			"batched functions must run in the async phase"
		} else {
			return Ok(());
		};

		Err(WorldError::InvalidUpdateFunction {
			function: self.id,
			reason,
		})
	}
}

impl fmt::Debug for UpdateFunctionDesc {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("UpdateFunctionDesc")
			.field("id", &self.id)
			.field("owner", &self.owner)
			.field("phase", &self.phase)
			.field("depends_on", &self.depends_on)
			.field("only_when_simulating", &self.only_when_simulating)
			.field("granularity", &self.granularity)
			.field("batched", &self.batched)
			.finish_non_exhaustive()
	}
}

fn downcast<C: Component>(manager: &mut dyn ComponentManagerBase) -> Result<&mut ComponentManager<C>> {
	let found = manager.component_type_id();
	match manager.as_any_mut().downcast_mut::<ComponentManager<C>>() {
		Some(manager) => Ok(manager),
		None => Err(WorldError::TypeMismatch {
			expected: C::component_type_id(),
			found,
		}),
	}
}
