//! Abstract machine state: known register values, the written-memory cache
//! and the invalidation primitives that keep both sound.

use super::Emitter;
use crate::consts::*;

use cinder_asm::{Opcode, Operand, Ptr, Reg, XmmReg};

use strum::IntoEnumIterator;
use tracing::trace;

/// Known value for registers the optimizer stopped tracking precisely: the
/// register still holds *something* live (its producing store can still turn
/// out dead), but no rewrite may be based on it. The label id carries no
/// meaning here.
pub(crate) const UNTRACKED: Operand = Operand::PtrLabel { label: 0, disp: 0 };

#[derive(Debug, Default, Clone, Copy)]
/// One slot of the written-memory cache.
pub(crate) struct MemCacheEntry {
    /// Tracked address; `None` marks a dead slot.
    pub address: Option<Ptr>,
    /// Value most recently transferred through the address.
    pub value: Operand,
}

impl Emitter {
    /// Slot holding an operand-equal address, if any.
    ///
    /// Every slot is scanned, not just the first `mem_cache_entries`: after
    /// the insert position wraps back to the middle, the tail still holds
    /// live entries.
    pub(crate) fn mem_find(&self, address: &Ptr) -> Option<usize> {
        self.mem_cache
            .iter()
            .position(|entry| !entry.value.is_none() && entry.address.as_ref() == Some(address))
    }

    /// Record `value` as the current content of `address`.
    ///
    /// A re-written address is promoted one slot toward the front. A new
    /// address is appended while there is room; once the cache fills up the
    /// insert position wraps back to the middle, so the hottest entries,
    /// which promotion has bubbled into the front half, are not evicted.
    pub(crate) fn mem_write(&mut self, address: Ptr, value: Operand) {
        if let Some(index) = self.mem_find(&address) {
            if index != 0 {
                self.mem_cache.swap(index - 1, index);
                self.mem_cache[index - 1].value = value;
            } else {
                self.mem_cache[0].value = value;
            }

            return;
        }

        let slot = if self.mem_cache_entries < MEMORY_STATE_SIZE {
            self.mem_cache_entries += 1;
            self.mem_cache_entries - 1
        } else {
            self.mem_cache_entries = MEMORY_STATE_SIZE / 2;
            MEMORY_STATE_SIZE - 1
        };

        self.mem_cache[slot] = MemCacheEntry {
            address: Some(address),
            value,
        };
    }

    /// Promote a hit entry one slot toward the front.
    pub(crate) fn mem_update(&mut self, index: usize) {
        if index != 0 {
            self.mem_cache.swap(index - 1, index);
        }
    }

    /// Forget everything: register values, read flags and the memory cache.
    ///
    /// Called wherever control flow can join from an unmodelled predecessor.
    pub(crate) fn invalidate_state(&mut self) {
        trace!("state invalidated");

        self.gen_reg = [Operand::None; Reg::COUNT];
        self.gen_reg_read = [false; Reg::COUNT];
        self.xmm_reg = [Operand::None; XmmReg::COUNT];
        self.xmm_reg_read = [false; XmmReg::COUNT];

        for entry in &mut self.mem_cache {
            entry.address = None;
        }

        self.mem_cache_entries = 0;
    }

    /// `reg` is about to be overwritten: no tracked value may keep
    /// substituting it.
    ///
    /// Register values that mention `reg` are demoted to [`UNTRACKED`]
    /// rather than dropped, so their own producing stores remain candidates
    /// for dead-store elimination. Cache entries that mention it in either
    /// position are dropped outright.
    pub(crate) fn invalidate_dependent(&mut self, reg: Reg) {
        for value in &mut self.gen_reg {
            if value.references(reg) {
                *value = UNTRACKED;
            }
        }

        for entry in &mut self.mem_cache {
            if entry.address.is_some_and(|address| address.references(reg)) {
                entry.address = None;
            }

            if entry.value.references(reg) {
                entry.value = Operand::None;
            }
        }
    }

    /// Xmm analog of [`Self::invalidate_dependent`].
    pub(crate) fn invalidate_dependent_xmm(&mut self, reg: XmmReg) {
        for value in &mut self.xmm_reg {
            if matches!(value, Operand::Xmm(mirror) if *mirror == reg) {
                *value = UNTRACKED;
            }
        }

        for entry in &mut self.mem_cache {
            if matches!(entry.value, Operand::Xmm(mirror) if mirror == reg) {
                entry.value = Operand::None;
            }
        }
    }

    /// A store to `address` happened: drop every register known-value loaded
    /// from memory the store may have changed.
    ///
    /// Constant pool entries are immutable and survive. Index-free values
    /// sharing the store's base survive when their byte ranges are disjoint.
    pub(crate) fn invalidate_address_value(&mut self, address: &Ptr) {
        for value in self.gen_reg.iter_mut().chain(self.xmm_reg.iter_mut()) {
            let Operand::Ptr(known) = value else {
                continue;
            };

            if known.is_const_pool() || known.provably_disjoint(address) {
                continue;
            }

            *value = Operand::None;
        }
    }

    /// Retire the producing store of every register whose current value was
    /// never observed, then forget all register values.
    pub(crate) fn kill_unread_registers(&mut self) {
        for reg in Reg::iter() {
            self.kill_gen(reg);
        }

        for reg in XmmReg::iter() {
            self.kill_xmm(reg);
        }
    }

    /// Drop the register's known value; if nothing observed that value, the
    /// instruction that produced it is retired in place.
    pub(crate) fn kill_gen(&mut self, reg: Reg) {
        let index = reg.index();

        if !self.gen_reg_read[index] && !self.gen_reg[index].is_none() {
            let producer = self.gen_reg_update[index];

            if !matches!(self.buf[producer].op, Opcode::None) {
                trace!(%reg, producer, "dead store retired");

                self.buf[producer].delete();
                self.optimization_count += 1;
            }
        }

        self.gen_reg[index] = Operand::None;
    }

    /// Xmm analog of [`Self::kill_gen`].
    pub(crate) fn kill_xmm(&mut self, reg: XmmReg) {
        let index = reg.index();

        if !self.xmm_reg_read[index] && !self.xmm_reg[index].is_none() {
            let producer = self.xmm_reg_update[index];

            if !matches!(self.buf[producer].op, Opcode::None) {
                trace!(%reg, producer, "dead store retired");

                self.buf[producer].delete();
                self.optimization_count += 1;
            }
        }

        self.xmm_reg[index] = Operand::None;
    }

    /// The register was written with a value the model understands.
    pub(crate) fn overwrite_gen_value(&mut self, reg: Reg, value: Operand) {
        self.kill_gen(reg);
        self.invalidate_dependent(reg);

        let index = reg.index();
        self.gen_reg[index] = value;
        self.gen_reg_update[index] = self.buf.len();
        self.gen_reg_read[index] = false;
    }

    /// The register was written with a value the model cannot describe.
    pub(crate) fn overwrite_gen_unknown(&mut self, reg: Reg) {
        self.kill_gen(reg);
        self.invalidate_dependent(reg);

        let index = reg.index();
        self.gen_reg[index] = Operand::None;
        self.gen_reg_update[index] = self.buf.len();
        self.gen_reg_read[index] = false;
    }

    /// The instruction both consumes and replaces the register's value, so
    /// the previous producer is not a dead-store candidate.
    pub(crate) fn read_modify_gen(&mut self, reg: Reg) {
        self.invalidate_dependent(reg);

        let index = reg.index();
        self.gen_reg[index] = Operand::None;
        self.gen_reg_update[index] = self.buf.len();
        self.gen_reg_read[index] = false;
    }

    /// Xmm analog of [`Self::overwrite_gen_value`].
    pub(crate) fn overwrite_xmm_value(&mut self, reg: XmmReg, value: Operand) {
        self.kill_xmm(reg);
        self.invalidate_dependent_xmm(reg);

        let index = reg.index();
        self.xmm_reg[index] = value;
        self.xmm_reg_update[index] = self.buf.len();
        self.xmm_reg_read[index] = false;
    }

    /// Xmm analog of [`Self::overwrite_gen_unknown`].
    pub(crate) fn overwrite_xmm_unknown(&mut self, reg: XmmReg) {
        self.kill_xmm(reg);
        self.invalidate_dependent_xmm(reg);

        let index = reg.index();
        self.xmm_reg[index] = Operand::None;
        self.xmm_reg_update[index] = self.buf.len();
        self.xmm_reg_read[index] = false;
    }

    /// Xmm analog of [`Self::read_modify_gen`].
    pub(crate) fn read_modify_xmm(&mut self, reg: XmmReg) {
        self.invalidate_dependent_xmm(reg);

        let index = reg.index();
        self.xmm_reg[index] = Operand::None;
        self.xmm_reg_update[index] = self.buf.len();
        self.xmm_reg_read[index] = false;
    }

    pub(crate) fn read_gen(&mut self, reg: Reg) {
        self.gen_reg_read[reg.index()] = true;
    }

    pub(crate) fn read_gen_opt(&mut self, reg: Option<Reg>) {
        if let Some(reg) = reg {
            self.read_gen(reg);
        }
    }

    pub(crate) fn read_xmm(&mut self, reg: XmmReg) {
        self.xmm_reg_read[reg.index()] = true;
    }

    /// Canonicalize an address computation through the known-value map:
    /// a base that mirrors another register is replaced by it, and known
    /// constant base/index registers are folded into the displacement.
    pub(crate) fn redirect_address(&self, ptr: &mut Ptr) {
        if let Some(base) = ptr.base {
            if let Operand::Reg(actual) = self.gen_reg[base.index()] {
                ptr.base = Some(actual);
            }
        }

        if let Some(base) = ptr.base {
            if let Operand::Num(num) = self.gen_reg[base.index()] {
                ptr.disp = ptr.disp.wrapping_add(num);
                ptr.base = None;
            }
        }

        if let Some(index) = ptr.index {
            if let Operand::Num(num) = self.gen_reg[index.index()] {
                ptr.disp = ptr.disp.wrapping_add(num.wrapping_mul(ptr.scale));
                ptr.scale = 1;
                ptr.index = None;
            }
        }
    }

    /// Source register to read instead of `reg`, when `reg` is known to
    /// mirror another register.
    pub(crate) fn redirect_gen(&self, reg: Reg) -> Reg {
        if let Operand::Reg(actual) = self.gen_reg[reg.index()] {
            actual
        } else {
            reg
        }
    }

    /// Xmm analog of [`Self::redirect_gen`].
    pub(crate) fn redirect_xmm(&self, reg: XmmReg) -> XmmReg {
        if let Operand::Xmm(actual) = self.xmm_reg[reg.index()] {
            actual
        } else {
            reg
        }
    }

    /// Mark the register as observed. Exposed for the translator's benefit:
    /// values that escape through an ABI (call arguments, returns) are read
    /// by code the emitter never sees.
    pub fn read_register(&mut self, reg: Reg) {
        if self.optimize {
            self.read_gen(reg);
        }
    }

    /// Xmm analog of [`Self::read_register`].
    pub fn read_xmm_register(&mut self, reg: XmmReg) {
        if self.optimize {
            self.read_xmm(reg);
        }
    }

    /// Drop the register's tracked value, retiring its producer when the
    /// value was never observed. Exposed for the translator: a register
    /// whose remaining lifetime the upstream knows to be over can be killed
    /// early to recover the dead store.
    pub fn kill_register(&mut self, reg: Reg) {
        if self.optimize {
            self.kill_gen(reg);
        }
    }

    /// Xmm analog of [`Self::kill_register`].
    pub fn kill_xmm_register(&mut self, reg: XmmReg) {
        if self.optimize {
            self.kill_xmm(reg);
        }
    }
}
