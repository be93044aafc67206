// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Cooperative, single-threaded, priority-based task scheduler.
//!
//! Tasks live in a fixed-capacity table and move between four intrusive
//! singly linked queues (`Ready`, `Waiting`, `Suspended`, `Dormant`) as
//! their state changes. Exactly one task is `Running` at any instant,
//! tracked outside the queues. A periodic external tick advances the
//! clock, decrements the running task's timeslice, and wakes sleepers
//! whose `wakeup_tick` has arrived.


use crate::addr::VmId;

/// Maximum number of tasks a process may schedule concurrently.
pub const MAX_TASKS: usize = 16;

/// Maximum number of mutexes a process may create.
pub const MAX_MUTEXES: usize = 16;

/// Ticks a task runs before preemption, absent an explicit override.
pub const DEFAULT_TIMESLICE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u16);

impl TaskId {
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MutexId(u16);

impl MutexId {
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Dormant,
    Ready,
    Running,
    Waiting,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitReason {
    Sleep,
    Mutex(MutexId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    TaskTableFull,
    MutexTableFull,
    WrongState,
    NotOwner,
    WouldDeadlock,
}

impl core::fmt::Display for SchedError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Self::TaskTableFull => "task table is full",
            Self::MutexTableFull => "mutex table is full",
            Self::WrongState => "task is not in the expected state",
            Self::NotOwner => "caller does not own this mutex",
            Self::WouldDeadlock => "task attempted to lock a mutex it already holds",
        };
        f.write_str(msg)
    }
}

#[derive(Clone, Copy)]
struct Tcb {
    state: TaskState,
    priority: u8,
    timeslice: u8,
    wakeup_tick: u64,
    wait_reason: Option<WaitReason>,
    vm_id: VmId,
    next: Option<TaskId>,
}

#[derive(Clone, Copy)]
struct MutexState {
    locked: bool,
    owner: Option<TaskId>,
}

/// A singly linked intrusive queue over the task table.
#[derive(Default, Clone, Copy)]
struct Queue {
    head: Option<TaskId>,
}

pub struct Scheduler {
    tasks: [Option<Tcb>; MAX_TASKS],
    task_count: u16,
    mutexes: [Option<MutexState>; MAX_MUTEXES],
    mutex_count: u16,
    ready: Queue,
    waiting: Queue,
    suspended: Queue,
    dormant: Queue,
    running: Option<TaskId>,
    tick: u64,
    preempt: bool,
}

impl Scheduler {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tasks: [None; MAX_TASKS],
            task_count: 0,
            mutexes: [None; MAX_MUTEXES],
            mutex_count: 0,
            ready: Queue { head: None },
            waiting: Queue { head: None },
            suspended: Queue { head: None },
            dormant: Queue { head: None },
            running: None,
            tick: 0,
            preempt: false,
        }
    }

    fn tcb(&self, id: TaskId) -> &Tcb {
        self.tasks[id.as_u16() as usize].as_ref().expect("dangling task id")
    }

    fn tcb_mut(&mut self, id: TaskId) -> &mut Tcb {
        self.tasks[id.as_u16() as usize].as_mut().expect("dangling task id")
    }

    #[must_use]
    pub fn state(&self, id: TaskId) -> TaskState {
        self.tcb(id).state
    }

    #[must_use]
    pub fn vm_id_of(&self, id: TaskId) -> VmId {
        self.tcb(id).vm_id
    }

    #[must_use]
    pub const fn preemption_requested(&self) -> bool {
        self.preempt
    }

    pub fn clear_preemption(&mut self) {
        self.preempt = false;
    }

    fn queue_mut(&mut self, state: TaskState) -> &mut Queue {
        match state {
            TaskState::Ready => &mut self.ready,
            TaskState::Waiting => &mut self.waiting,
            TaskState::Suspended => &mut self.suspended,
            TaskState::Dormant => &mut self.dormant,
            TaskState::Running => unreachable!("Running tasks are not queued"),
        }
    }

    fn unlink(&mut self, state: TaskState, id: TaskId) {
        let mut queue = *self.queue_mut(state);
        if queue.head == Some(id) {
            queue.head = self.tcb(id).next;
        } else {
            let mut cursor = queue.head;
            while let Some(node) = cursor {
                let next = self.tcb(node).next;
                if next == Some(id) {
                    let after = self.tcb(id).next;
                    self.tcb_mut(node).next = after;
                    break;
                }
                cursor = next;
            }
        }
        *self.queue_mut(state) = queue;
        self.tcb_mut(id).next = None;
    }

    fn enqueue_fifo(&mut self, state: TaskState, id: TaskId) {
        let mut queue = *self.queue_mut(state);
        match queue.head {
            None => queue.head = Some(id),
            Some(head) => {
                let mut cursor = head;
                while let Some(next) = self.tcb(cursor).next {
                    cursor = next;
                }
                self.tcb_mut(cursor).next = Some(id);
            }
        }
        *self.queue_mut(state) = queue;
    }

    /// Insert into `q_ready`, ordered ascending by priority with new tasks
    /// going to the tail of their priority class.
    fn enqueue_ready(&mut self, id: TaskId) {
        let priority = self.tcb(id).priority;
        let mut queue = self.ready;
        match queue.head {
            Some(head) if self.tcb(head).priority <= priority => {
                let mut cursor = head;
                while let Some(next) = self.tcb(cursor).next {
                    if self.tcb(next).priority > priority {
                        break;
                    }
                    cursor = next;
                }
                let after = self.tcb(cursor).next;
                self.tcb_mut(cursor).next = Some(id);
                self.tcb_mut(id).next = after;
            }
            _ => {
                self.tcb_mut(id).next = queue.head;
                queue.head = Some(id);
            }
        }
        self.ready = queue;
    }

    fn transition(&mut self, id: TaskId, to: TaskState) {
        let from = self.tcb(id).state;
        if from != TaskState::Running {
            self.unlink(from, id);
        }
        self.tcb_mut(id).state = to;
        match to {
            TaskState::Ready => self.enqueue_ready(id),
            TaskState::Running => {}
            other => self.enqueue_fifo(other, id),
        }
    }

    /// Register a new task in `Dormant`. Does not make it runnable; call
    /// [`Scheduler::start_task`] to move it to `Ready`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedError::TaskTableFull`] once [`MAX_TASKS`] is reached.
    pub fn create_task(&mut self, vm_id: VmId, priority: u8) -> Result<TaskId, SchedError> {
        let idx = self.task_count as usize;
        if idx >= MAX_TASKS {
            return Err(SchedError::TaskTableFull);
        }
        self.tasks[idx] = Some(Tcb {
            state: TaskState::Dormant,
            priority,
            timeslice: DEFAULT_TIMESLICE,
            wakeup_tick: 0,
            wait_reason: None,
            vm_id,
            next: None,
        });
        self.task_count += 1;
        let id = TaskId::new(idx as u16);
        self.enqueue_fifo(TaskState::Dormant, id);
        Ok(id)
    }

    /// Move a `Dormant` task to `Ready`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedError::WrongState`] if the task is not `Dormant`.
    pub fn start_task(&mut self, id: TaskId) -> Result<(), SchedError> {
        if self.tcb(id).state != TaskState::Dormant {
            return Err(SchedError::WrongState);
        }
        self.transition(id, TaskState::Ready);
        Ok(())
    }

    /// Pop the head of `Ready` and mark it `Running`.
    pub fn schedule_next(&mut self) -> Option<TaskId> {
        let id = self.ready.head?;
        self.unlink(TaskState::Ready, id);
        self.tcb_mut(id).state = TaskState::Running;
        self.tcb_mut(id).timeslice = DEFAULT_TIMESLICE;
        self.running = Some(id);
        Some(id)
    }

    /// Move the currently running task back to the tail of its priority
    /// class in `Ready` (a completed or preempted timeslice).
    pub fn requeue_running(&mut self) {
        if let Some(id) = self.running.take() {
            self.transition(id, TaskState::Ready);
        }
    }

    pub fn sleep_ms(&mut self, id: TaskId, ms: u64) {
        if self.running == Some(id) {
            self.running = None;
        }
        self.tcb_mut(id).wakeup_tick = self.tick + ms;
        self.tcb_mut(id).wait_reason = Some(WaitReason::Sleep);
        self.transition(id, TaskState::Waiting);
        self.preempt = true;
    }

    /// # Errors
    ///
    /// Returns [`SchedError::WrongState`] if `id` is not `Running` or
    /// `Ready`.
    pub fn suspend(&mut self, id: TaskId) -> Result<(), SchedError> {
        if !matches!(self.tcb(id).state, TaskState::Running | TaskState::Ready) {
            return Err(SchedError::WrongState);
        }
        if self.running == Some(id) {
            self.running = None;
        }
        self.transition(id, TaskState::Suspended);
        self.preempt = true;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`SchedError::WrongState`] if `id` is not `Suspended`.
    pub fn resume(&mut self, id: TaskId) -> Result<(), SchedError> {
        if self.tcb(id).state != TaskState::Suspended {
            return Err(SchedError::WrongState);
        }
        self.transition(id, TaskState::Ready);
        self.preempt = true;
        Ok(())
    }

    pub fn relinquish(&mut self, id: TaskId) {
        if self.running == Some(id) {
            self.tcb_mut(id).timeslice = 0;
        }
        self.preempt = true;
    }

    pub fn change_priority(&mut self, id: TaskId, priority: u8) {
        self.tcb_mut(id).priority = priority;
        self.preempt = true;
    }

    /// Advance the clock by one tick: decrement the running task's
    /// timeslice and wake any sleepers whose deadline has arrived.
    pub fn tick(&mut self) {
        self.tick += 1;

        if let Some(id) = self.running {
            let tcb = self.tcb_mut(id);
            tcb.timeslice = tcb.timeslice.saturating_sub(1);
            if tcb.timeslice == 0 {
                self.preempt = true;
            }
        }

        let mut woken = false;
        let mut cursor = self.waiting.head;
        let mut due = [None; MAX_TASKS];
        let mut due_len = 0;
        while let Some(id) = cursor {
            let tcb = self.tcb(id);
            cursor = tcb.next;
            if tcb.wait_reason == Some(WaitReason::Sleep) && tcb.wakeup_tick <= self.tick {
                due[due_len] = Some(id);
                due_len += 1;
            }
        }
        for slot in due.iter().take(due_len) {
            if let Some(id) = slot {
                self.transition(*id, TaskState::Ready);
                woken = true;
            }
        }
        if woken {
            self.preempt = true;
        }
    }

    /// # Errors
    ///
    /// Returns [`SchedError::MutexTableFull`] once [`MAX_MUTEXES`] is
    /// reached.
    pub fn create_mutex(&mut self) -> Result<MutexId, SchedError> {
        let idx = self.mutex_count as usize;
        if idx >= MAX_MUTEXES {
            return Err(SchedError::MutexTableFull);
        }
        self.mutexes[idx] = Some(MutexState { locked: false, owner: None });
        self.mutex_count += 1;
        Ok(MutexId::new(idx as u16))
    }

    fn mutex(&self, id: MutexId) -> &MutexState {
        self.mutexes[id.0 as usize].as_ref().expect("dangling mutex id")
    }

    /// Returns `true` if the lock was acquired immediately, `false` if the
    /// caller is now `Waiting` for it.
    ///
    /// # Errors
    ///
    /// Returns [`SchedError::WouldDeadlock`] if the caller already owns
    /// this mutex.
    pub fn lock(&mut self, caller: TaskId, mutex: MutexId) -> Result<bool, SchedError> {
        let state = *self.mutex(mutex);
        if !state.locked {
            self.mutexes[mutex.0 as usize] = Some(MutexState {
                locked: true,
                owner: Some(caller),
            });
            return Ok(true);
        }
        if state.owner == Some(caller) {
            return Err(SchedError::WouldDeadlock);
        }
        if self.running == Some(caller) {
            self.running = None;
        }
        self.tcb_mut(caller).wait_reason = Some(WaitReason::Mutex(mutex));
        self.transition(caller, TaskState::Waiting);
        self.preempt = true;
        Ok(false)
    }

    #[must_use]
    pub fn try_lock(&mut self, caller: TaskId, mutex: MutexId) -> bool {
        let state = *self.mutex(mutex);
        if state.locked {
            return false;
        }
        self.mutexes[mutex.0 as usize] = Some(MutexState {
            locked: true,
            owner: Some(caller),
        });
        true
    }

    /// # Errors
    ///
    /// Returns [`SchedError::NotOwner`] if the mutex is unlocked or the
    /// caller does not own it.
    pub fn unlock(&mut self, caller: TaskId, mutex: MutexId) -> Result<(), SchedError> {
        let state = *self.mutex(mutex);
        if !state.locked || state.owner != Some(caller) {
            return Err(SchedError::NotOwner);
        }

        let mut cursor = self.waiting.head;
        let mut next_owner = None;
        while let Some(id) = cursor {
            let tcb = self.tcb(id);
            cursor = tcb.next;
            if tcb.wait_reason == Some(WaitReason::Mutex(mutex)) {
                next_owner = Some(id);
                break;
            }
        }

        match next_owner {
            Some(id) => {
                self.mutexes[mutex.0 as usize] = Some(MutexState {
                    locked: true,
                    owner: Some(id),
                });
                self.transition(id, TaskState::Ready);
                self.preempt = true;
            }
            None => {
                self.mutexes[mutex.0 as usize] = Some(MutexState { locked: false, owner: None });
            }
        }
        Ok(())
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
