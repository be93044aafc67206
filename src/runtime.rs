// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The process: the single object an embedder creates, loads bytecode
//! into, and drives. Ties the allocator, value system, interpreter, and
//! scheduler together behind the four calls described by the external
//! interface (`init`/`create_task`/`start_task`/`run`) plus method
//! registration.
//!
//! A [`Runtime`] owns everything process-wide (heap, symbol table, class
//! registry, bootstrap classes, native method table, globals, constants,
//! scheduler) and one [`Vm`] per task it has created. It borrows the
//! platform for the duration of a [`Runtime::run`] or [`Runtime::tick`]
//! call rather than owning it, matching [`Vm::step`]'s own convention.

use crate::addr::VmId;
use crate::alloc::{AllocError, Tlsf};
use crate::alloc_crate::vec::Vec;
use crate::intrinsics::{self, Bootstrap, NativeFn};
use crate::loader::Irep;
use crate::platform::Platform;
use crate::sched::{MAX_TASKS, Scheduler, SchedError, TaskId, TaskState};
use crate::value::class::{ClassError, ClassId, ClassTable};
use crate::value::symbol::SymbolTable;
use crate::vm::{Consts, Globals, StepOutcome, Vm};

/// Errors a `Runtime` call can surface to the embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    /// The heap pool could not be initialized.
    Alloc(AllocError),
    /// The class or method table is full.
    Class(ClassError),
    /// The scheduler rejected the call (wrong state, table full, ...).
    Sched(SchedError),
    /// `create_task` was called after the task table and vm-id space
    /// (bounded by [`VmId`]'s `u8` width) are both exhausted.
    TooManyTasks,
}

impl core::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Alloc(e) => write!(f, "{e}"),
            Self::Class(e) => write!(f, "{e}"),
            Self::Sched(e) => write!(f, "{e}"),
            Self::TooManyTasks => write!(f, "no vm-id slots remain for a new task"),
        }
    }
}

impl From<AllocError> for RuntimeError {
    fn from(e: AllocError) -> Self {
        Self::Alloc(e)
    }
}

impl From<ClassError> for RuntimeError {
    fn from(e: ClassError) -> Self {
        Self::Class(e)
    }
}

impl From<SchedError> for RuntimeError {
    fn from(e: SchedError) -> Self {
        Self::Sched(e)
    }
}

/// The process-wide state plus one interpreter per scheduled task.
///
/// `'buf` is the lifetime of the caller-supplied heap pool; `'img` is the
/// lifetime of the caller-supplied bytecode images, which must outlive
/// every task created from them (per §6's "the image must outlive the
/// VM").
pub struct Runtime<'buf, 'img> {
    heap: Tlsf<'buf>,
    symbols: SymbolTable,
    classes: ClassTable,
    bootstrap: Bootstrap,
    natives: Vec<NativeFn>,
    globals: Globals,
    consts: Consts,
    sched: Scheduler,
    vms: Vec<Vm<'img>>,
    /// Tracks tasks that have executed `STOP`, since the scheduler's own
    /// state enum has no terminal state distinct from `Suspended`.
    halted: Vec<bool>,
}

impl<'buf, 'img> Runtime<'buf, 'img> {
    /// Install `pool` as the process heap and register the bootstrap
    /// class hierarchy (`Object`, `Integer`, `Array`, ... — see
    /// [`intrinsics::install`]). Corresponds to §6's `init(pool_ptr,
    /// pool_size)`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Alloc`] if `pool` is too small or too
    /// large for the allocator, and [`RuntimeError::Class`] if the
    /// bootstrap class/method tables overflow (both fixed, compile-time
    /// capacities of the embedding, so this only fails if those
    /// capacities are misconfigured).
    pub fn init(pool: &'buf mut [u8]) -> Result<Self, RuntimeError> {
        let mut heap = Tlsf::new(pool)?;
        let mut symbols = SymbolTable::new();
        let mut classes = ClassTable::new();
        let (bootstrap, natives) = intrinsics::install(&mut heap, &mut classes, &mut symbols)?;

        Ok(Self {
            heap,
            symbols,
            classes,
            bootstrap,
            natives,
            globals: Globals::new(),
            consts: Consts::new(),
            sched: Scheduler::new(),
            vms: Vec::new(),
            halted: Vec::new(),
        })
    }

    #[must_use]
    pub fn bootstrap(&self) -> &Bootstrap {
        &self.bootstrap
    }

    #[must_use]
    pub fn alloc_stats(&self, vm_id: Option<VmId>) -> crate::alloc::AllocStats {
        self.heap.stats(vm_id)
    }

    /// Define a new class. Corresponds to §6's `define_class(name,
    /// super_class) → class`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Class`] once the class table is full.
    pub fn define_class(&mut self, name: &str, super_class: Option<ClassId>) -> Result<ClassId, RuntimeError> {
        let sym = self.symbols.intern(name);
        Ok(self.classes.define_class(sym, super_class)?)
    }

    /// Register a host-implemented native method on `class`. Corresponds
    /// to §6's `define_method(class, name, native_fn)`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Class`] once the method table is full.
    pub fn define_method(&mut self, class: ClassId, name: &str, native: NativeFn) -> Result<(), RuntimeError> {
        let sym = self.symbols.intern(name);
        let idx = self.natives.len() as u16;
        let addr = crate::value::proc::new_native(&mut self.heap, VmId::PROCESS, idx).map_err(|_| ClassError::MethodTableFull)?;
        self.classes.define_method(class, sym, crate::value::Value::Proc(addr))?;
        self.natives.push(native);
        Ok(())
    }

    /// Parse-and-load `bytecode` as a new task's program, open a `Vm` for
    /// it, and enter it in `Ready`. Corresponds to §6's
    /// `create_task(bytecode_ptr, optional tcb) → task`; `tcb` here is
    /// `priority`, since task slots are otherwise allocated by the
    /// scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::TooManyTasks`] if every `VmId` slot or
    /// task-table slot is already in use, and [`RuntimeError::Sched`] if
    /// the scheduler rejects the call for any other reason.
    pub fn create_task(&mut self, root: &'img Irep<'img>, priority: u8) -> Result<TaskId, RuntimeError> {
        if self.vms.len() >= MAX_TASKS || self.vms.len() >= usize::from(u8::MAX) {
            return Err(RuntimeError::TooManyTasks);
        }
        let vm_id = VmId::new(self.vms.len() as u8 + 1);
        let task_id = self.sched.create_task(vm_id, priority)?;
        self.vms.push(Vm::new(root, vm_id));
        self.halted.push(false);
        Ok(task_id)
    }

    /// Move a freshly created task from `Dormant` to `Ready`. Corresponds
    /// to §6's `start_task(task) → result`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Sched`] if `id` is not `Dormant`.
    pub fn start_task(&mut self, id: TaskId) -> Result<(), RuntimeError> {
        self.sched.start_task(id)?;
        Ok(())
    }

    /// Advance the scheduler's clock by one tick. Corresponds to §6's
    /// `tick()`, the host's periodic timer entry point.
    pub fn tick(&mut self) {
        self.sched.tick();
    }

    /// Run the task at the head of `Ready` until it yields, its
    /// timeslice expires, or it halts, then reclaim its heap if it
    /// halted. Returns `false` when no task was `Ready` (the caller
    /// should call [`Platform::idle`] and wait for the next tick).
    fn run_one(&mut self, platform: &mut dyn Platform) -> bool {
        let Some(id) = self.sched.schedule_next() else {
            return false;
        };
        let idx = id.as_u16() as usize;

        loop {
            let outcome = self.vms[idx].step(
                &mut self.heap,
                &mut self.symbols,
                &mut self.classes,
                &self.bootstrap,
                &self.natives,
                platform,
                &mut self.globals,
                &mut self.consts,
            );

            if outcome == StepOutcome::Stopped {
                let vm_id = self.vms[idx].vm_id();
                self.heap.free_all(vm_id);
                self.halted[idx] = true;
                // A halted task never runs again; park it in `Suspended`
                // rather than feeding it back through `Ready`/`Dormant`.
                if self.sched.state(id) == TaskState::Running {
                    let _ = self.sched.suspend(id);
                }
                self.sched.clear_preemption();
                return true;
            }

            if self.sched.preemption_requested() {
                self.sched.clear_preemption();
                if self.sched.state(id) == TaskState::Running {
                    self.sched.requeue_running();
                }
                return true;
            }
        }
    }

    /// Drive the scheduler's main loop to completion: run tasks until
    /// every task has halted or is stuck `Suspended` with no pending
    /// resume. Corresponds to §6's `run()`.
    ///
    /// A real embedding supplies its own tick source (e.g. a timer
    /// interrupt calling [`Runtime::tick`]); a host with no such source —
    /// like the bundled CLI driver — has nothing else to advance sleeping
    /// tasks' wakeup deadlines, so this loop ticks its own virtual clock
    /// once per idle spin, matching how a single-threaded host would
    /// otherwise starve `sleep_ms`.
    pub fn run(&mut self, platform: &mut dyn Platform) {
        loop {
            if self.run_one(platform) {
                continue;
            }
            if !self.has_runnable_task() {
                break;
            }
            self.sched.tick();
            platform.idle();
        }
    }

    /// A task that has neither halted nor been parked `Suspended`
    /// forever still has work left to do.
    fn has_runnable_task(&self) -> bool {
        (0..self.vms.len()).any(|i| !self.halted[i] && self.sched.state(TaskId::new(i as u16)) != TaskState::Suspended)
    }
}
