// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The register-based interpreter: fetch/decode/dispatch over a fixed
//! opcode set, a call-info stack for method invocation, and the
//! global/constant tables method lookup and top-level code both read
//! from.
//!
//! A [`Vm`] owns only its own register file, call-info stack, and
//! program counter. The heap, symbol table, class registry, and platform
//! are process-wide and borrowed for the duration of one
//! [`Vm::step`] call, so several `Vm`s (one per scheduled task) can share
//! them without any of this module reaching for a lock.


use crate::addr::VmId;
use crate::alloc::Tlsf;
use crate::error::ErrorCode;
use crate::intrinsics::{self, Bootstrap, NativeCall};
use crate::loader::{self, Irep, PoolValue};
use crate::opcode::{self, op};
use crate::platform::{Platform, PlatformExt};
use crate::value::class::ClassTable;
use crate::value::symbol::{SymbolId, SymbolTable};
use crate::value::{array, class, hash, proc as vproc, range, string, ClassId, Value};
use alloc_crate::vec::Vec;

/// Register file size per task.
pub const REG_COUNT: usize = 100;

/// Call-info stack depth per task.
pub const CALLINFO_COUNT: usize = 100;

/// Capacity of the process-wide global and constant tables.
pub const NAME_TABLE_SIZE: usize = 64;

#[derive(Clone, Copy)]
struct CallInfo<'img> {
    irep: &'img Irep<'img>,
    pc: usize,
    regs_base: u16,
    target_class: Option<ClassId>,
    block: Option<crate::addr::Addr>,
}

/// Outcome of one [`Vm::step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Stopped,
}

/// A sorted, binary-searched symbol-to-value table, for the process-wide
/// globals and constants (§3's "fixed-capacity array, ordered by symbol
/// id; created on first write, overwritten on subsequent writes").
pub struct NameTable<const N: usize> {
    keys: [Option<SymbolId>; N],
    values: [Value; N],
    len: usize,
}

impl<const N: usize> NameTable<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            keys: [None; N],
            values: [Value::Nil; N],
            len: 0,
        }
    }

    fn find(&self, name: SymbolId) -> Result<usize, usize> {
        let mut lo = 0;
        let mut hi = self.len;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let key = self.keys[mid].expect("hole in a compacted name table");
            match key.cmp(&name) {
                core::cmp::Ordering::Less => lo = mid + 1,
                core::cmp::Ordering::Greater => hi = mid,
                core::cmp::Ordering::Equal => return Ok(mid),
            }
        }
        Err(lo)
    }

    #[must_use]
    pub fn get(&self, name: SymbolId) -> Value {
        match self.find(name) {
            Ok(idx) => self.values[idx],
            Err(_) => Value::Nil,
        }
    }

    /// Set `name` to `value`, retagging it as process-owned (`vm_id = 0`)
    /// since this table outlives any one task.
    ///
    /// # Panics
    ///
    /// Panics if the table is full and `name` was not already present —
    /// a fixed, compile-time-known capacity of the embedding.
    pub fn set(&mut self, heap: &mut Tlsf, symbols: &SymbolTable, name: SymbolId, value: Value) {
        let value = {
            let mut v = value;
            v.retag_vm_id(heap, VmId::PROCESS);
            v
        };
        match self.find(name) {
            Ok(idx) => {
                self.values[idx].release(heap, symbols);
                self.values[idx] = value;
            }
            Err(at) => {
                assert!(self.len < N, "name table is full");
                for i in (at..self.len).rev() {
                    self.keys[i + 1] = self.keys[i];
                    self.values[i + 1] = self.values[i];
                }
                self.keys[at] = Some(name);
                self.values[at] = value;
                self.len += 1;
            }
        }
    }
}

impl<const N: usize> Default for NameTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide global variables (`$foo`), keyed by symbol id.
pub type Globals = NameTable<NAME_TABLE_SIZE>;

/// Process-wide constants (`Foo`), keyed by symbol id.
pub type Consts = NameTable<NAME_TABLE_SIZE>;

/// One task's interpreter state: registers, call-info stack, program
/// counter, and the flattened table of ireps this task's image was
/// parsed into (see [`loader::flatten`]).
pub struct Vm<'img> {
    regs: [Value; REG_COUNT],
    callinfo: [Option<CallInfo<'img>>; CALLINFO_COUNT],
    depth: usize,
    cur_irep: &'img Irep<'img>,
    ireps: Vec<&'img Irep<'img>>,
    pc: usize,
    regs_base: u16,
    target_class: Option<ClassId>,
    /// The literal block passed to the currently executing frame, read by
    /// `BLKPUSH`. `None` at the root frame and for any frame entered
    /// without one.
    current_block: Option<crate::addr::Addr>,
    vm_id: VmId,
    error: Option<ErrorCode>,
}

impl<'img> Vm<'img> {
    #[must_use]
    pub fn new(root: &'img Irep<'img>, vm_id: VmId) -> Self {
        Self {
            regs: [Value::Nil; REG_COUNT],
            callinfo: [None; CALLINFO_COUNT],
            depth: 0,
            cur_irep: root,
            ireps: loader::flatten(root),
            pc: 0,
            regs_base: 0,
            target_class: None,
            current_block: None,
            vm_id,
            error: None,
        }
    }

    #[must_use]
    pub const fn vm_id(&self) -> VmId {
        self.vm_id
    }

    #[must_use]
    pub const fn last_error(&self) -> Option<ErrorCode> {
        self.error
    }

    #[must_use]
    pub fn reg_abs(&self, index: u16) -> Value {
        self.regs[index as usize]
    }

    pub fn set_reg_abs(&mut self, index: u16, value: Value, symbols: &SymbolTable, heap: &mut Tlsf) {
        self.regs[index as usize].release(heap, symbols);
        self.regs[index as usize] = value;
    }

    fn reg(&self, i: u16) -> Value {
        self.reg_abs(self.regs_base + i)
    }

    fn set_reg(&mut self, i: u16, value: Value, symbols: &SymbolTable, heap: &mut Tlsf) {
        self.set_reg_abs(self.regs_base + i, value, symbols, heap);
    }

    fn diagnostic(platform: &mut dyn Platform, msg: &str) {
        platform.write_str("vm: ");
        platform.write_line(msg);
    }

    fn fetch(&mut self) -> Option<u32> {
        let code = self.cur_irep.code;
        let bytes = code.get(self.pc..self.pc + 4)?;
        self.pc += 4;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn jump(&mut self, displacement: i32) {
        let base = self.pc as i64;
        let target = base + i64::from(displacement) * 4 - 4; // sBx is measured in instructions from this one
        self.pc = target.max(0) as usize;
    }

    fn push_frame(&mut self, irep: &'img Irep<'img>, new_regs_base: u16, block: Option<crate::addr::Addr>) -> bool {
        if self.depth >= CALLINFO_COUNT {
            return false;
        }
        self.callinfo[self.depth] = Some(CallInfo {
            irep: self.cur_irep,
            pc: self.pc,
            regs_base: self.regs_base,
            target_class: self.target_class,
            block: self.current_block,
        });
        self.depth += 1;
        self.cur_irep = irep;
        self.pc = 0;
        self.regs_base = new_regs_base;
        self.target_class = None;
        self.current_block = block;
        true
    }

    fn pop_frame(&mut self) -> bool {
        if self.depth == 0 {
            return false;
        }
        self.depth -= 1;
        let frame = self.callinfo[self.depth].take().expect("call-info hole");
        self.cur_irep = frame.irep;
        self.pc = frame.pc;
        self.regs_base = frame.regs_base;
        self.target_class = frame.target_class;
        self.current_block = frame.block;
        true
    }

    /// Resolve the flat irep index for a child reference, for `LAMBDA`.
    /// Linear scan by reference identity; method counts on an embedded
    /// target are small enough that this never shows up in a profile.
    fn flat_index_of(&self, target: &'img Irep<'img>) -> u16 {
        self.ireps
            .iter()
            .position(|candidate| core::ptr::eq(*candidate, target))
            .expect("lambda target irep not in this vm's flattened table") as u16
    }

    fn load_pool_value(&mut self, heap: &mut Tlsf, index: u16) -> Value {
        match self.cur_irep.pool.get(index as usize) {
            Some(PoolValue::String(bytes)) => match string::new(heap, self.vm_id, bytes) {
                Ok(addr) => Value::String(addr),
                Err(_) => Value::Nil,
            },
            Some(PoolValue::Fixnum(n)) => Value::fixnum(*n),
            #[cfg(feature = "float")]
            Some(PoolValue::Float(f)) => Value::Float(*f),
            #[cfg(not(feature = "float"))]
            Some(PoolValue::FloatUnsupported) => Value::Nil,
            None => Value::Nil,
        }
    }

    fn intern_symbol(&self, symbols: &mut SymbolTable, index: u16) -> SymbolId {
        let bytes = self.cur_irep.symbols.get(index as usize).copied().unwrap_or(b"");
        let name = core::str::from_utf8(bytes).unwrap_or("?");
        symbols.intern(name)
    }

    /// Execute exactly one instruction.
    #[allow(clippy::too_many_lines)]
    pub fn step(
        &mut self,
        heap: &mut Tlsf,
        symbols: &mut SymbolTable,
        classes: &mut ClassTable,
        bootstrap: &Bootstrap,
        natives: &[intrinsics::NativeFn],
        platform: &mut dyn Platform,
        globals: &mut Globals,
        consts: &mut Consts,
    ) -> StepOutcome {
        let Some(word) = self.fetch() else {
            return StepOutcome::Stopped;
        };
        let opc = opcode::opcode(word);
        let a = opcode::a(word);
        let b = opcode::b(word);
        let c = opcode::c(word);
        let bx = opcode::bx(word);
        let sbx = opcode::sbx(word);

        match opc {
            op::NOP => {}
            op::MOVE => {
                let v = self.reg(b);
                let v = v.dup(heap);
                self.set_reg(a, v, symbols, heap);
            }
            op::LOADL => {
                let v = self.load_pool_value(heap, bx as u16);
                self.set_reg(a, v, symbols, heap);
            }
            op::LOADI => {
                self.set_reg(a, Value::fixnum(sbx), symbols, heap);
            }
            op::LOADSYM => {
                let sym = self.intern_symbol(symbols, bx as u16);
                self.set_reg(a, Value::Symbol(sym), symbols, heap);
            }
            op::LOADNIL => self.set_reg(a, Value::Nil, symbols, heap),
            op::LOADSELF => {
                let v = self.reg(0).dup(heap);
                self.set_reg(a, v, symbols, heap);
            }
            op::LOADT => self.set_reg(a, Value::True, symbols, heap),
            op::LOADF => self.set_reg(a, Value::False, symbols, heap),
            op::GETGLOBAL => {
                let sym = self.intern_symbol(symbols, bx as u16);
                let v = globals.get(sym).dup(heap);
                self.set_reg(a, v, symbols, heap);
            }
            op::GETCONST => {
                let sym = self.intern_symbol(symbols, bx as u16);
                let v = consts.get(sym).dup(heap);
                self.set_reg(a, v, symbols, heap);
            }
            op::SETGLOBAL => {
                let sym = self.intern_symbol(symbols, bx as u16);
                let v = self.reg(a).dup(heap);
                globals.set(heap, symbols, sym, v);
            }
            op::SETCONST => {
                let sym = self.intern_symbol(symbols, bx as u16);
                let v = self.reg(a).dup(heap);
                consts.set(heap, symbols, sym, v);
            }
            op::GETIV => {
                let Value::Object(addr) = self.reg(0) else {
                    self.set_reg(a, Value::Nil, symbols, heap);
                    return StepOutcome::Continue;
                };
                let sym = self.intern_symbol(symbols, b);
                let v = class::get_ivar(heap, addr, sym).dup(heap);
                self.set_reg(a, v, symbols, heap);
            }
            op::SETIV => {
                if let Value::Object(addr) = self.reg(0) {
                    let sym = self.intern_symbol(symbols, b);
                    let v = self.reg(a).dup(heap);
                    let _ = class::set_ivar(heap, symbols, self.vm_id, addr, sym, v);
                }
            }
            op::GETUPVAR => {
                let v = self.upvar_reg(c, b).dup(heap);
                self.set_reg(a, v, symbols, heap);
            }
            op::SETUPVAR => {
                let v = self.reg(a).dup(heap);
                self.set_upvar_reg(c, b, v, symbols, heap);
            }
            op::JMP => self.jump(sbx),
            op::JMPIF => {
                if self.reg(a).is_truthy() {
                    self.jump(sbx);
                }
            }
            op::JMPNOT => {
                if !self.reg(a).is_truthy() {
                    self.jump(sbx);
                }
            }
            op::SEND | op::SENDB => {
                let sym = self.intern_symbol(symbols, b);
                let block = if opc == op::SENDB {
                    match self.reg(a + 1 + c) {
                        Value::Proc(addr) => Some(addr),
                        _ => None,
                    }
                } else {
                    None
                };
                self.dispatch_send(heap, symbols, classes, bootstrap, natives, platform, globals, consts, a, sym, c as u8, block);
            }
            op::CALL => {
                let recv = self.reg(a);
                if let Value::Proc(addr) = recv {
                    self.invoke_proc(heap, symbols, classes, bootstrap, natives, platform, globals, consts, addr, a, c as u8, None);
                } else {
                    Self::diagnostic(platform, "CALL on a non-Proc value");
                }
            }
            op::ENTER => self.enter(bx, heap, symbols),
            op::RETURN => {
                let value = self.reg(a);
                if !self.pop_frame() {
                    self.regs[0] = value;
                    return StepOutcome::Stopped;
                }
                let dest = self.regs_base;
                self.regs[dest as usize] = value;
            }
            op::BLKPUSH => {
                // `b`'s call-depth/register descriptor bits aren't modeled;
                // this always resolves to the current frame's own block.
                let _ = b;
                let v = self.current_block.map_or(Value::Nil, Value::Proc).dup(heap);
                self.set_reg(a, v, symbols, heap);
            }
            op::ADD => self.numeric_binop(a, b, c, platform, symbols, heap, |x, y| x.wrapping_add(y), |x, y| x + y),
            op::SUB => self.numeric_binop(a, b, c, platform, symbols, heap, |x, y| x.wrapping_sub(y), |x, y| x - y),
            op::MUL => self.numeric_binop(a, b, c, platform, symbols, heap, |x, y| x.wrapping_mul(y), |x, y| x * y),
            op::DIV => {
                let lhs = self.reg(a);
                let rhs = self.reg(b);
                let result = match (lhs, rhs) {
                    (Value::Fixnum(_), Value::Fixnum(0)) => Value::Nil,
                    (Value::Fixnum(x), Value::Fixnum(y)) => Value::fixnum(x.wrapping_div(y)),
                    #[cfg(feature = "float")]
                    (Value::Float(x), Value::Float(y)) => Value::Float(x / y),
                    #[cfg(feature = "float")]
                    (Value::Fixnum(x), Value::Float(y)) => Value::Float(f64::from(x) / y),
                    #[cfg(feature = "float")]
                    (Value::Float(x), Value::Fixnum(y)) => Value::Float(x / f64::from(y)),
                    _ => Value::Nil,
                };
                self.set_reg(a, result, symbols, heap);
            }
            op::ADDI => {
                let lhs = self.reg(a);
                let result = match lhs {
                    Value::Fixnum(x) => Value::fixnum(x.wrapping_add(i32::from(c))),
                    other => other,
                };
                self.set_reg(a, result, symbols, heap);
            }
            op::SUBI => {
                let lhs = self.reg(a);
                let result = match lhs {
                    Value::Fixnum(x) => Value::fixnum(x.wrapping_sub(i32::from(c))),
                    other => other,
                };
                self.set_reg(a, result, symbols, heap);
            }
            op::EQ | op::LT | op::LE | op::GT | op::GE => {
                let lhs = self.reg(a);
                let rhs = self.reg(b);
                let ord = lhs.compare(rhs, heap, symbols);
                let truth = match opc {
                    op::EQ => ord == core::cmp::Ordering::Equal,
                    op::LT => ord == core::cmp::Ordering::Less,
                    op::LE => ord != core::cmp::Ordering::Greater,
                    op::GT => ord == core::cmp::Ordering::Greater,
                    _ => ord != core::cmp::Ordering::Less,
                };
                self.set_reg(a, Value::bool(truth), symbols, heap);
            }
            op::ARRAY => {
                let result = array::new(heap, self.vm_id).ok().map_or(Value::Nil, Value::Array);
                if let Value::Array(addr) = result {
                    for i in 0..c {
                        let v = self.reg(a + i).dup(heap);
                        let _ = array::push(heap, self.vm_id, addr, v);
                    }
                }
                self.set_reg(a, result, symbols, heap);
            }
            op::STRING => {
                let v = self.load_pool_value(heap, bx as u16);
                self.set_reg(a, v, symbols, heap);
            }
            op::STRCAT => {
                if let (Value::String(dest), Value::String(src)) = (self.reg(a), self.reg(b)) {
                    let bytes: Vec<u8> = string::bytes(heap, src).to_vec();
                    let _ = string::append(heap, self.vm_id, dest, &bytes);
                }
            }
            op::HASH => {
                let result = hash::new(heap, self.vm_id).ok().map_or(Value::Nil, Value::Hash);
                if let Value::Hash(addr) = result {
                    let mut i = 0;
                    while i + 1 < c {
                        let k = self.reg(a + i).dup(heap);
                        let v = self.reg(a + i + 1).dup(heap);
                        let _ = hash::insert(heap, symbols, self.vm_id, addr, k, v);
                        i += 2;
                    }
                }
                self.set_reg(a, result, symbols, heap);
            }
            op::LAMBDA => {
                let Some(child) = self.cur_irep.reps.get(bx as usize) else {
                    self.set_reg(a, Value::Nil, symbols, heap);
                    return StepOutcome::Continue;
                };
                let flat = self.flat_index_of(child);
                let result = vproc::new_bytecode(heap, self.vm_id, flat).ok().map_or(Value::Nil, Value::Proc);
                self.set_reg(a, result, symbols, heap);
            }
            op::RANGE => {
                let first = self.reg(a + 1);
                let last = self.reg(a + 2);
                let exclude = c != 0;
                let result = range::new(heap, self.vm_id, first, last, exclude).ok().map_or(Value::Nil, Value::Range);
                self.set_reg(a, result, symbols, heap);
            }
            op::CLASS => {
                let name = self.intern_symbol(symbols, b);
                let super_class = match self.reg(a) {
                    Value::Class(id) => Some(id),
                    _ => None,
                };
                match classes.define_class(name, super_class) {
                    Ok(id) => self.set_reg(a, Value::Class(id), symbols, heap),
                    Err(_) => Self::diagnostic(platform, "class table is full"),
                }
            }
            op::EXEC => {
                // Method body execution is covered by SEND/CALL reaching a
                // Bytecode proc; EXEC as a standalone opcode is a no-op
                // placeholder the loader may still emit for empty bodies.
            }
            op::METHOD => {
                let Value::Class(class_id) = self.reg(a) else {
                    Self::diagnostic(platform, "METHOD target is not a class");
                    return StepOutcome::Continue;
                };
                let name = self.intern_symbol(symbols, b);
                let body = self.reg(c);
                if classes.define_method(class_id, name, body).is_err() {
                    Self::diagnostic(platform, "method table is full");
                }
            }
            op::TCLASS => {
                let class_value = self.target_class.map_or(Value::Nil, Value::Class);
                self.set_reg(a, class_value, symbols, heap);
            }
            op::STOP => return StepOutcome::Stopped,
            op::ABORT => {
                Self::diagnostic(platform, "ABORT executed");
                return StepOutcome::Stopped;
            }
            other => {
                let _ = other;
                Self::diagnostic(platform, "unknown opcode, skipped");
            }
        }

        StepOutcome::Continue
    }

    fn upvar_reg(&self, rc: u16, b: u16) -> Value {
        let levels = rc + 2;
        let mut depth = self.depth;
        let mut base = self.regs_base;
        for _ in 0..levels.saturating_sub(1) {
            if depth == 0 {
                return Value::Nil;
            }
            depth -= 1;
            base = self.callinfo[depth].expect("call-info hole").regs_base;
        }
        self.reg_abs(base + b)
    }

    fn set_upvar_reg(&mut self, rc: u16, b: u16, value: Value, symbols: &SymbolTable, heap: &mut Tlsf) {
        let levels = rc + 2;
        let mut depth = self.depth;
        let mut base = self.regs_base;
        for _ in 0..levels.saturating_sub(1) {
            if depth == 0 {
                return;
            }
            depth -= 1;
            base = self.callinfo[depth].expect("call-info hole").regs_base;
        }
        self.set_reg_abs(base + b, value, symbols, heap);
    }

    /// `ENTER`'s argument descriptor is only partially honored: only the
    /// optional-argument count is read, and missing optional arguments are
    /// filled with `Nil`. See the design notes on default-argument handling.
    fn enter(&mut self, ax: u32, heap: &mut Tlsf, symbols: &SymbolTable) {
        let required = ((ax >> 18) & 0x1f) as u16;
        let optional = ((ax >> 13) & 0x1f) as u16;
        for i in 0..optional {
            let slot = required + i + 1;
            if matches!(self.reg(slot), Value::Nil) {
                self.set_reg(slot, Value::Nil, symbols, heap);
            }
        }
    }

    fn numeric_binop(
        &mut self,
        a: u16,
        b: u16,
        _c: u16,
        platform: &mut dyn Platform,
        symbols: &mut SymbolTable,
        heap: &mut Tlsf,
        int_op: fn(i32, i32) -> i32,
        #[cfg_attr(not(feature = "float"), allow(unused_variables))] float_op: fn(f64, f64) -> f64,
    ) {
        let lhs = self.reg(a);
        let rhs = self.reg(b);
        let result = match (lhs, rhs) {
            (Value::Fixnum(x), Value::Fixnum(y)) => Value::fixnum(int_op(x, y)),
            #[cfg(feature = "float")]
            (Value::Float(x), Value::Float(y)) => Value::Float(float_op(x, y)),
            #[cfg(feature = "float")]
            (Value::Fixnum(x), Value::Float(y)) => Value::Float(float_op(f64::from(x), y)),
            #[cfg(feature = "float")]
            (Value::Float(x), Value::Fixnum(y)) => Value::Float(float_op(x, f64::from(y))),
            _ => {
                Self::diagnostic(platform, "numeric op on non-numeric operand, method dispatch not retried here");
                Value::Nil
            }
        };
        self.set_reg(a, result, symbols, heap);
    }

    #[allow(clippy::too_many_arguments)]
    fn dispatch_send(
        &mut self,
        heap: &mut Tlsf,
        symbols: &mut SymbolTable,
        classes: &mut ClassTable,
        bootstrap: &Bootstrap,
        natives: &[intrinsics::NativeFn],
        platform: &mut dyn Platform,
        globals: &mut Globals,
        consts: &mut Consts,
        a: u16,
        method: SymbolId,
        argc: u8,
        block: Option<crate::addr::Addr>,
    ) {
        let recv_abs = self.regs_base + a;
        let receiver = self.reg_abs(recv_abs);
        let recv_class = intrinsics::class_of(bootstrap, heap, receiver);
        match classes.lookup_method(recv_class, method) {
            Some(Value::Proc(proc_addr)) => {
                self.invoke_with_proc(heap, symbols, classes, bootstrap, natives, platform, globals, consts, proc_addr, recv_abs, argc, block);
            }
            _ => {
                Self::diagnostic(platform, "no method found for send");
                self.set_reg_abs(recv_abs, Value::Nil, symbols, heap);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn invoke_proc(
        &mut self,
        heap: &mut Tlsf,
        symbols: &mut SymbolTable,
        classes: &mut ClassTable,
        bootstrap: &Bootstrap,
        natives: &[intrinsics::NativeFn],
        platform: &mut dyn Platform,
        globals: &mut Globals,
        consts: &mut Consts,
        proc_addr: crate::addr::Addr,
        a: u16,
        argc: u8,
        block: Option<crate::addr::Addr>,
    ) {
        let recv_abs = self.regs_base + a;
        self.invoke_with_proc(heap, symbols, classes, bootstrap, natives, platform, globals, consts, proc_addr, recv_abs, argc, block);
    }

    #[allow(clippy::too_many_arguments)]
    fn invoke_with_proc(
        &mut self,
        heap: &mut Tlsf,
        symbols: &mut SymbolTable,
        classes: &mut ClassTable,
        bootstrap: &Bootstrap,
        natives: &[intrinsics::NativeFn],
        platform: &mut dyn Platform,
        globals: &mut Globals,
        consts: &mut Consts,
        proc_addr: crate::addr::Addr,
        recv_abs: u16,
        argc: u8,
        block: Option<crate::addr::Addr>,
    ) {
        match vproc::kind(heap, proc_addr) {
            vproc::ProcKind::Native(idx) => {
                let Some(f) = natives.get(idx as usize).copied() else {
                    Self::diagnostic(platform, "native method index out of range");
                    return;
                };
                let mut call = NativeCall {
                    vm: self,
                    heap,
                    symbols,
                    classes,
                    bootstrap,
                    platform,
                    natives,
                    globals,
                    consts,
                    window_base: recv_abs,
                    argc,
                    block,
                };
                f(&mut call);
            }
            vproc::ProcKind::Bytecode(flat_index) => {
                let Some(irep) = self.ireps.get(flat_index as usize).copied() else {
                    Self::diagnostic(platform, "dangling bytecode proc");
                    return;
                };
                if !self.push_frame(irep, recv_abs, block) {
                    Self::diagnostic(platform, "call-info stack exhausted");
                    let _ = self.pop_frame();
                }
            }
        }
    }

    /// Run a block proc (always a bytecode closure formed by `LAMBDA`) to
    /// completion, for a native method that needs to yield to it (e.g.
    /// `Integer#times`). Arguments land in a fresh register window right
    /// above the calling frame's own, so the block can't alias live
    /// registers the caller still needs.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn invoke_block(
        &mut self,
        heap: &mut Tlsf,
        symbols: &mut SymbolTable,
        classes: &mut ClassTable,
        bootstrap: &Bootstrap,
        natives: &[intrinsics::NativeFn],
        platform: &mut dyn Platform,
        globals: &mut Globals,
        consts: &mut Consts,
        proc_addr: crate::addr::Addr,
        args: &[Value],
    ) -> Value {
        let vproc::ProcKind::Bytecode(flat_index) = vproc::kind(heap, proc_addr) else {
            Self::diagnostic(platform, "block is not a bytecode proc");
            return Value::Nil;
        };
        let Some(irep) = self.ireps.get(flat_index as usize).copied() else {
            Self::diagnostic(platform, "dangling block proc");
            return Value::Nil;
        };

        let new_base = self.regs_base + self.cur_irep.nregs;
        if usize::from(new_base) + usize::from(irep.nregs) > REG_COUNT {
            Self::diagnostic(platform, "register file exhausted invoking block");
            return Value::Nil;
        }
        for (i, value) in args.iter().enumerate() {
            self.set_reg_abs(new_base + i as u16, *value, symbols, heap);
        }

        let starting_depth = self.depth;
        let guard_base = self.regs_base;
        // RETURN writes its value into `regs_base + 0` of the frame it
        // pops back into, which here is the native's own calling frame —
        // save and restore that register so the block's return value
        // doesn't clobber whatever the caller already had there.
        let guard = self.regs[guard_base as usize];
        let block = self.current_block;
        if !self.push_frame(irep, new_base, block) {
            Self::diagnostic(platform, "call-info stack exhausted invoking block");
            return Value::Nil;
        }

        let mut result = Value::Nil;
        loop {
            let outcome = self.step(heap, symbols, classes, bootstrap, natives, platform, globals, consts);
            if self.depth == starting_depth {
                result = self.regs[guard_base as usize];
                break;
            }
            if outcome == StepOutcome::Stopped {
                // Fell off the end without an explicit RETURN; unwind back
                // to the calling frame so state stays consistent.
                while self.depth > starting_depth {
                    if !self.pop_frame() {
                        break;
                    }
                }
                break;
            }
        }
        self.regs[guard_base as usize] = guard;
        result
    }
}
