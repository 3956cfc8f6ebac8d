use crate::updates::{Phase, UpdateContext, UpdateFunctionDesc, UpdateFunctionId};
use super::update_function::UpdateCallback;
use crate::components::{ComponentManagerBase, ComponentTypeId};
use crate::error::{Result, WorldError};
use tracing::{debug, error, trace, trace_span};
use std::collections::HashMap;

struct RegisteredFunction {
	owner: ComponentTypeId,
	phase: Phase,
	depends_on: Vec<UpdateFunctionId>,
	only_when_simulating: bool,
	granularity: u16,
	callback: UpdateCallback,
}

#[derive(Default, Copy, Clone, Eq, PartialEq)]
enum ScheduleState {
	#[default]
	Dirty,
	Resolved,
}

#[derive(Default)]
struct PhaseSchedule {
	registered: Vec<UpdateFunctionId>,
	order: Vec<UpdateFunctionId>,
	state: ScheduleState,
}

#[derive(Copy, Clone, Eq, PartialEq)]
enum Mark {
	Visiting,
	Done,
}

/// Orders registered update functions inside each [Phase].
///
/// Every function runs after all of its dependencies. Functions that don't depend on each other
/// run in registration order. The order of a phase is recomputed lazily, the first time the phase
/// runs after a registration or deregistration touched it.
#[derive(Default)]
pub struct UpdateScheduler {
	functions: HashMap<UpdateFunctionId, RegisteredFunction>,
	phases: [PhaseSchedule; Phase::COUNT],
}

impl UpdateScheduler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add an update function.
	///
	/// Fails if the description is inconsistent, if a function with the same id exists,
	/// or if the function closes a dependency cycle. Dependencies don't need to be registered yet.
	pub fn register(&mut self, desc: UpdateFunctionDesc) -> Result<UpdateFunctionId> {
		desc.validate()?;

		let id = desc.id;
		if self.functions.contains_key(&id) {
			return Err(WorldError::DuplicateUpdateFunction(id));
		}

		let phase = desc.phase;
		self.functions.insert(id, RegisteredFunction {
			owner: desc.owner,
			phase,
			depends_on: desc.depends_on,
			only_when_simulating: desc.only_when_simulating,
			granularity: desc.granularity,
			callback: desc.callback,
		});

		let schedule = &mut self.phases[phase.index()];
		schedule.registered.push(id);
		schedule.state = ScheduleState::Dirty;

		if let Err(err) = self.sort_phase(phase, false) {
			self.remove(id);
			error!(function = %id, "rejected update function: {}", err);
			return Err(err);
		}

		debug!(function = %id, ?phase, "registered update function");
		Ok(id)
	}

	/// Remove an update function, along with every dependency edge pointing at it.
	/// Returns `false` if no function with this id was registered.
	pub fn deregister(&mut self, id: UpdateFunctionId) -> bool {
		if !self.remove(id) {
			return false;
		}

		for function in self.functions.values_mut() {
			function.depends_on.retain(|dependency| *dependency != id);
		}
		for schedule in self.phases.iter_mut() {
			schedule.state = ScheduleState::Dirty;
		}

		debug!(function = %id, "deregistered update function");
		true
	}

	/// Deregister every function owned by the manager of `owner`.
	/// Returns the number of removed functions.
	pub fn deregister_owner(&mut self, owner: ComponentTypeId) -> usize {
		let owned: Vec<UpdateFunctionId> = self
			.phases
			.iter()
			.flat_map(|schedule| schedule.registered.iter())
			.filter(|id| self.functions.get(*id).map_or(false, |function| function.owner == owner))
			.copied()
			.collect();

		for id in owned.iter() {
			self.deregister(*id);
		}
		owned.len()
	}

	/// Compute the execution order of every phase that changed since the last call.
	pub fn resolve(&mut self) -> Result<()> {
		for phase in Phase::ALL {
			if self.phases[phase.index()].state == ScheduleState::Resolved {
				continue;
			}

			let order = match self.sort_phase(phase, true) {
				Ok(order) => order,
				Err(err) => {
					error!(?phase, "cannot order update functions: {}", err);
					return Err(err);
				},
			};

			let schedule = &mut self.phases[phase.index()];
			schedule.order = order;
			schedule.state = ScheduleState::Resolved;
		}
		Ok(())
	}

	/// The order in which the functions of `phase` will run.
	pub fn execution_order(&mut self, phase: Phase) -> Result<&[UpdateFunctionId]> {
		self.resolve()?;
		Ok(&self.phases[phase.index()].order)
	}

	pub fn is_registered(&self, id: UpdateFunctionId) -> bool {
		self.functions.contains_key(&id)
	}

	pub fn function_count(&self) -> usize {
		self.functions.len()
	}

	pub fn is_resolved(&self) -> bool {
		self.phases.iter().all(|schedule| schedule.state == ScheduleState::Resolved)
	}

	/// Run every function of `phase` in execution order.
	/// [resolve](Self::resolve) must have been called since the last change.
	pub(crate) fn run_phase(
		&mut self, phase: Phase, managers: &mut [Option<Box<dyn ComponentManagerBase>>], ctx: &UpdateContext<'_>,
	) -> Result<()> {
		let Self { functions, phases } = self;
		let schedule = &phases[phase.index()];
		debug_assert!(schedule.state == ScheduleState::Resolved, "Phase {:?} was not resolved", phase);

		for id in schedule.order.iter() {
			let Some(function) = functions.get_mut(id) else {
				continue;
			};

			if function.only_when_simulating && !ctx.is_simulation_enabled() {
				trace!(function = %id, "skipped while simulation is disabled");
				continue;
			}

			let manager = managers
				.get_mut(function.owner.index())
				.and_then(|manager| manager.as_deref_mut())
				.ok_or(WorldError::ManagerNotFound(function.owner))?;

			let _span = trace_span!("update_function", function = %id).entered();
			(function.callback)(manager, &ctx.with_granularity(function.granularity))?;
		}
		Ok(())
	}

	fn remove(&mut self, id: UpdateFunctionId) -> bool {
		let Some(function) = self.functions.remove(&id) else {
			return false;
		};

		let schedule = &mut self.phases[function.phase.index()];
		schedule.registered.retain(|registered| *registered != id);
		schedule.order.retain(|ordered| *ordered != id);
		schedule.state = ScheduleState::Dirty;
		true
	}

	/// Topologically sort the functions of `phase`.
	/// Unless `strict`, dependencies that are missing or live in another phase are ignored.
	fn sort_phase(&self, phase: Phase, strict: bool) -> Result<Vec<UpdateFunctionId>> {
		let registered = &self.phases[phase.index()].registered;
		let mut marks = HashMap::with_capacity(registered.len());
		let mut order = Vec::with_capacity(registered.len());
		let mut path = Vec::new();

		for id in registered.iter() {
			self.visit(*id, phase, strict, &mut marks, &mut path, &mut order)?;
		}
		Ok(order)
	}

	fn visit(
		&self, id: UpdateFunctionId, phase: Phase, strict: bool, marks: &mut HashMap<UpdateFunctionId, Mark>,
		path: &mut Vec<UpdateFunctionId>, order: &mut Vec<UpdateFunctionId>,
	) -> Result<()> {
		match marks.get(&id) {
			Some(Mark::Done) => return Ok(()),
			Some(Mark::Visiting) => {
				let start = path.iter().position(|visited| *visited == id).unwrap_or(0);
				return Err(WorldError::CyclicDependency {
					phase,
					cycle: path[start..].to_vec(),
				});
			},
			None => {},
		}

		let Some(function) = self.functions.get(&id) else {
			return Ok(());
		};

		marks.insert(id, Mark::Visiting);
		path.push(id);

		for dependency in function.depends_on.iter() {
			match self.functions.get(dependency).map(|dependency| dependency.phase) {
				Some(dependency_phase) if dependency_phase == phase => {
					self.visit(*dependency, phase, strict, marks, path, order)?;
				},
				// Earlier phases have already run
				Some(dependency_phase) if dependency_phase < phase => {},
				Some(_) if strict => {
					return Err(WorldError::DependencyPhaseMismatch {
						function: id,
						dependency: *dependency,
					});
				},
				None if strict => {
					return Err(WorldError::MissingDependency {
						function: id,
						dependency: *dependency,
					});
				},
				_ => {},
			}
		}

		path.pop();
		marks.insert(id, Mark::Done);
		order.push(id);
		Ok(())
	}
}
