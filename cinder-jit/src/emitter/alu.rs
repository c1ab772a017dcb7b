//! Register-destination entry points: single-register forms, immediate
//! forms and the register-register forms with their rewrites.

use super::Emitter;

use cinder_asm::{Instruction, Opcode, Operand, Reg, XmmReg};

use tracing::trace;

impl Emitter {
    /// Emit an instruction with a single register operand: `Call reg` or a
    /// conditional byte set.
    ///
    /// # Panics
    ///
    /// Any other opcode.
    pub fn emit_reg(&mut self, op: Opcode, reg: Reg) {
        if self.optimize {
            match op {
                Opcode::Call => {
                    self.read_gen(reg);

                    self.kill_unread_registers();
                    self.invalidate_state();
                }
                // Only the low byte is written; the rest of the register
                // value survives, so the previous producer stays live.
                op if op.is_setcc() => self.read_modify_gen(reg),
                _ => panic!("invalid single-register instruction: {op}"),
            }
        }

        self.push(Instruction::new(op, Operand::Reg(reg), Operand::None));
    }

    /// Emit an instruction with a register destination and a 32-bit
    /// immediate source.
    ///
    /// Loading a constant the register is already known to hold emits
    /// nothing. `Movsx` with an immediate degenerates to `Mov`.
    ///
    /// # Panics
    ///
    /// Opcodes other than `Mov`, `Add`/`Sub`, `Imul` and their 64-bit
    /// variants.
    pub fn emit_reg_num(&mut self, op: Opcode, reg: Reg, num: i32) {
        let op = if matches!(op, Opcode::Movsx) { Opcode::Mov } else { op };

        if self.optimize {
            match op {
                Opcode::Mov => {
                    if self.gen_reg[reg.index()] == Operand::Num(num) {
                        trace!(%reg, num, "redundant constant load skipped");

                        self.optimization_count += 1;
                        return;
                    }

                    self.overwrite_gen_value(reg, Operand::Num(num));
                }
                Opcode::Add | Opcode::Sub | Opcode::Add64 | Opcode::Sub64 => {
                    // Stack frame setup; esp stays untracked.
                    if reg != Reg::Esp {
                        self.read_modify_gen(reg);
                    }
                }
                Opcode::Imul | Opcode::Imul64 => self.read_modify_gen(reg),
                _ => panic!("invalid register-immediate instruction: {op}"),
            }
        }

        self.push(Instruction::new(op, Operand::Reg(reg), Operand::Num(num)));
    }

    /// Emit `Mov64 reg, imm64`. Reloading an identical constant emits
    /// nothing.
    ///
    /// # Panics
    ///
    /// Opcodes other than `Mov64`.
    pub fn emit_reg_imm64(&mut self, op: Opcode, reg: Reg, num: u64) {
        if self.optimize {
            match op {
                Opcode::Mov64 => {
                    if self.gen_reg[reg.index()] == Operand::Imm64(num) {
                        trace!(%reg, num, "redundant constant load skipped");

                        self.optimization_count += 1;
                        return;
                    }

                    self.overwrite_gen_value(reg, Operand::Imm64(num));
                }
                _ => panic!("invalid register-immediate64 instruction: {op}"),
            }
        }

        self.push(Instruction::new(op, Operand::Reg(reg), Operand::Imm64(num)));
    }

    /// Emit an instruction with general-purpose register destination and
    /// source.
    ///
    /// Rewrites performed when the source has a usable known value:
    /// self-assignments disappear, `Add`/`Sub` from a known constant become
    /// the immediate form, `And`/`Or`/`Imul` from a register mirroring
    /// memory become the memory form, and `Imul` of two known constants
    /// becomes a constant load.
    ///
    /// # Panics
    ///
    /// Opcodes outside the move/arithmetic/shift/compare surface below.
    pub fn emit_reg_reg(&mut self, op: Opcode, dst: Reg, mut src: Reg) {
        if self.optimize {
            match op {
                Opcode::Mov | Opcode::Mov64 => {
                    src = self.redirect_gen(src);

                    if dst == src {
                        trace!(%dst, "self-assignment skipped");

                        self.optimization_count += 1;
                        return;
                    }

                    self.overwrite_gen_value(dst, Operand::Reg(src));
                    self.read_gen(src);
                }
                Opcode::Xor | Opcode::Xor64 if dst == src => {
                    // Zeroing idiom; the write must stay visible to the
                    // dead-store bookkeeping, but the value is dropped.
                    self.kill_gen(dst);
                    self.invalidate_dependent(dst);
                }
                Opcode::Xor | Opcode::Xor64 => {
                    self.read_gen(src);
                    self.read_modify_gen(dst);
                }
                Opcode::Cmp | Opcode::Test => {
                    src = self.redirect_gen(src);

                    self.read_gen(dst);
                    self.read_gen(src);
                }
                Opcode::Add | Opcode::Sub => {
                    src = self.redirect_gen(src);

                    if let Operand::Num(num) = self.gen_reg[src.index()] {
                        self.emit_reg_num(op, dst, num);
                        return;
                    }

                    self.read_gen(src);
                    self.read_modify_gen(dst);
                }
                Opcode::Add64 | Opcode::Sub64 => {
                    src = self.redirect_gen(src);

                    self.read_gen(src);
                    self.read_modify_gen(dst);
                }
                Opcode::Sal | Opcode::Sar | Opcode::Sal64 | Opcode::Sar64 => {
                    // The count operand is architecturally pinned to ecx;
                    // no redirection is possible.
                    self.read_gen(src);
                    self.read_modify_gen(dst);
                }
                Opcode::And | Opcode::Or | Opcode::And64 | Opcode::Or64 => {
                    src = self.redirect_gen(src);

                    if let Operand::Ptr(ptr) = self.gen_reg[src.index()] {
                        self.emit_reg_mem(op, dst, ptr);
                        return;
                    }

                    self.read_gen(src);
                    self.read_modify_gen(dst);
                }
                Opcode::Imul => {
                    if let (Operand::Num(a), Operand::Num(b)) =
                        (self.gen_reg[dst.index()], self.gen_reg[src.index()])
                    {
                        self.emit_reg_num(Opcode::Mov, dst, a.wrapping_mul(b));
                        return;
                    }

                    if let Operand::Ptr(ptr) = self.gen_reg[src.index()] {
                        self.emit_reg_mem(op, dst, ptr);
                        return;
                    }

                    self.read_gen(src);
                    self.read_modify_gen(dst);
                }
                _ => panic!("invalid register-register instruction: {op}"),
            }
        }

        self.push(Instruction::new(op, Operand::Reg(dst), Operand::Reg(src)));
    }

    /// Emit an instruction with xmm destination and source: `Movss`/`Movsd`
    /// or the scalar double-precision arithmetic and compare family.
    ///
    /// Self-assignments, including those only visible after redirecting the
    /// source through the known-value map, emit nothing.
    ///
    /// # Panics
    ///
    /// Any other opcode.
    pub fn emit_xmm_xmm(&mut self, op: Opcode, dst: XmmReg, mut src: XmmReg) {
        if self.optimize {
            match op {
                Opcode::Movss | Opcode::Movsd => {
                    src = self.redirect_xmm(src);

                    if dst == src {
                        trace!(%dst, "self-assignment skipped");

                        self.optimization_count += 1;
                        return;
                    }

                    self.overwrite_xmm_value(dst, Operand::Xmm(src));
                    self.read_xmm(src);
                }
                Opcode::Addsd
                | Opcode::Subsd
                | Opcode::Mulsd
                | Opcode::Divsd
                | Opcode::Cmpeqsd
                | Opcode::Cmpltsd
                | Opcode::Cmplesd
                | Opcode::Cmpneqsd => {
                    src = self.redirect_xmm(src);

                    self.read_xmm(src);
                    self.read_modify_xmm(dst);
                }
                _ => panic!("invalid xmm-register instruction: {op}"),
            }
        }

        self.push(Instruction::new(op, Operand::Xmm(dst), Operand::Xmm(src)));
    }
}
