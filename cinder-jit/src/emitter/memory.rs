//! Memory-operand entry points: loads, stores and immediate stores, plus
//! label-address computation.
//!
//! Every address is canonicalized through the known-value map before the
//! opcode is considered, so cache lookups and alias checks always compare
//! addresses in the same form.

use super::Emitter;

use cinder_asm::{Instruction, LabelId, Opcode, Operand, Ptr, Reg, Size, XmmReg};

use strum::IntoEnumIterator;

impl Emitter {
    /// Emit a load-class instruction with a general-purpose destination.
    ///
    /// A plain `Mov` whose source address is known to mirror a register
    /// (through the written-memory cache, or through another register that
    /// was loaded from the same address) is rewritten into a register
    /// move. `Movsx` and `Mov64` are never rewritten; they only record what
    /// the destination now holds.
    ///
    /// # Panics
    ///
    /// Opcodes other than `Mov`/`Movsx`/`Mov64`, `Lea`, `Imul` and the
    /// `And`/`Or` family.
    pub fn emit_reg_mem(&mut self, op: Opcode, dst: Reg, mut ptr: Ptr) {
        if self.optimize {
            self.redirect_address(&mut ptr);

            self.read_gen_opt(ptr.base);
            self.read_gen_opt(ptr.index);

            match op {
                Opcode::Mov | Opcode::Movsx | Opcode::Mov64 => {
                    // No reuse across stack-pointer addressing: esp moves
                    // under the model's feet, so [esp+k] is not a stable
                    // name for a location.
                    if matches!(op, Opcode::Mov) && ptr.base != Some(Reg::Esp) {
                        if let Some(index) = self.mem_find(&ptr) {
                            if let Operand::Reg(cached) = self.mem_cache[index].value {
                                self.emit_reg_reg(Opcode::Mov, dst, cached);
                                self.mem_update(index);
                                return;
                            }
                        }

                        for reg in Reg::iter() {
                            if self.gen_reg[reg.index()] == Operand::Ptr(ptr) {
                                self.emit_reg_reg(Opcode::Mov, dst, reg);
                                return;
                            }
                        }
                    }

                    // A destination that feeds its own address computation
                    // no longer mirrors the loaded location.
                    if ptr.references(dst) {
                        self.overwrite_gen_unknown(dst);
                    } else {
                        self.overwrite_gen_value(dst, Operand::Ptr(ptr));
                    }
                }
                Opcode::Lea => self.overwrite_gen_unknown(dst),
                Opcode::Imul
                | Opcode::And
                | Opcode::And64
                | Opcode::Or
                | Opcode::Or64 => self.read_modify_gen(dst),
                _ => panic!("invalid register-memory instruction: {op}"),
            }
        }

        self.push(Instruction::new(op, Operand::Reg(dst), Operand::Ptr(ptr)));
    }

    /// Emit a load-class instruction with an xmm destination.
    ///
    /// `Movss`/`Movsd` loads are rewritten into register moves when the
    /// address is known to mirror an xmm register; the conversion family
    /// only consumes the address.
    ///
    /// # Panics
    ///
    /// Opcodes other than `Movss`/`Movsd` and `Cvtss2sd`/`Cvtsd2ss`/
    /// `Cvtsi2sd`.
    pub fn emit_xmm_mem(&mut self, op: Opcode, dst: XmmReg, mut ptr: Ptr) {
        if self.optimize {
            self.redirect_address(&mut ptr);

            match op {
                Opcode::Cvtss2sd | Opcode::Cvtsd2ss | Opcode::Cvtsi2sd => {
                    self.read_gen_opt(ptr.base);
                    self.read_gen_opt(ptr.index);

                    self.overwrite_xmm_unknown(dst);
                }
                Opcode::Movss | Opcode::Movsd => {
                    if ptr.base != Some(Reg::Esp) {
                        if let Some(index) = self.mem_find(&ptr) {
                            if let Operand::Xmm(cached) = self.mem_cache[index].value {
                                self.emit_xmm_xmm(op, dst, cached);
                                self.mem_update(index);
                                return;
                            }
                        }

                        for reg in XmmReg::iter() {
                            if self.xmm_reg[reg.index()] == Operand::Ptr(ptr) {
                                self.emit_xmm_xmm(op, dst, reg);
                                return;
                            }
                        }
                    }

                    self.read_gen_opt(ptr.base);
                    self.read_gen_opt(ptr.index);

                    self.overwrite_xmm_value(dst, Operand::Ptr(ptr));
                }
                _ => panic!("invalid xmm-memory instruction: {op}"),
            }
        }

        self.push(Instruction::new(op, Operand::Xmm(dst), Operand::Ptr(ptr)));
    }

    /// Emit a store of a general-purpose register.
    ///
    /// A doubleword store of a register with a known constant becomes an
    /// immediate store. Otherwise the store drops every register value the
    /// write may alias, then records that both the source register and the
    /// memory cache mirror the stored location.
    ///
    /// # Panics
    ///
    /// Opcodes other than `Mov`/`Mov64`; stores through `esp` (spills use
    /// dedicated frame slots).
    pub fn emit_mem_reg(&mut self, op: Opcode, mut ptr: Ptr, mut src: Reg) {
        if self.optimize {
            self.redirect_address(&mut ptr);

            src = self.redirect_gen(src);

            if matches!(ptr.size, Size::Dword) {
                if let Operand::Num(num) = self.gen_reg[src.index()] {
                    self.emit_mem_num(op, ptr, num);
                    return;
                }
            }

            self.read_gen_opt(ptr.base);
            self.read_gen_opt(ptr.index);
            self.read_gen(src);

            match op {
                Opcode::Mov | Opcode::Mov64 => {
                    assert!(
                        ptr.base != Some(Reg::Esp),
                        "store through the stack pointer"
                    );

                    self.invalidate_address_value(&ptr);

                    // The register now definitively mirrors the stored
                    // location; an unknown or memory-valued register gains
                    // a trackable value here. Not when the register feeds
                    // the address itself: a value must never describe a
                    // location through the register it belongs to.
                    if !ptr.references(src)
                        && matches!(
                            self.gen_reg[src.index()],
                            Operand::None | Operand::Ptr(_)
                        )
                    {
                        self.gen_reg[src.index()] = Operand::Ptr(ptr);
                    }

                    self.mem_write(ptr, Operand::Reg(src));
                }
                _ => panic!("invalid memory-register instruction: {op}"),
            }
        }

        self.push(Instruction::new(op, Operand::Ptr(ptr), Operand::Reg(src)));
    }

    /// Emit a store of an xmm register; the xmm analog of
    /// [`Self::emit_mem_reg`].
    ///
    /// # Panics
    ///
    /// Opcodes other than `Movss`/`Movsd`; stores through `esp`.
    pub fn emit_mem_xmm(&mut self, op: Opcode, mut ptr: Ptr, src: XmmReg) {
        if self.optimize {
            self.redirect_address(&mut ptr);

            self.read_gen_opt(ptr.base);
            self.read_gen_opt(ptr.index);
            self.read_xmm(src);

            match op {
                Opcode::Movss | Opcode::Movsd => {
                    assert!(
                        ptr.base != Some(Reg::Esp),
                        "store through the stack pointer"
                    );

                    self.invalidate_address_value(&ptr);

                    if matches!(
                        self.xmm_reg[src.index()],
                        Operand::None | Operand::Ptr(_)
                    ) {
                        self.xmm_reg[src.index()] = Operand::Ptr(ptr);
                    }

                    self.mem_write(ptr, Operand::Xmm(src));
                }
                _ => panic!("invalid memory-xmm instruction: {op}"),
            }
        }

        self.push(Instruction::new(op, Operand::Ptr(ptr), Operand::Xmm(src)));
    }

    /// Emit a store of a 32-bit immediate, or an in-memory `Add`.
    ///
    /// # Panics
    ///
    /// Opcodes other than `Mov`/`Mov64`/`Add`; immediate stores through
    /// `esp`.
    pub fn emit_mem_num(&mut self, op: Opcode, mut ptr: Ptr, num: i32) {
        if self.optimize {
            self.redirect_address(&mut ptr);

            self.read_gen_opt(ptr.base);
            self.read_gen_opt(ptr.index);

            match op {
                Opcode::Mov | Opcode::Mov64 => {
                    assert!(
                        ptr.base != Some(Reg::Esp),
                        "store through the stack pointer"
                    );

                    self.invalidate_address_value(&ptr);
                    self.mem_write(ptr, Operand::Num(num));
                }
                Opcode::Add => self.invalidate_address_value(&ptr),
                _ => panic!("invalid memory-immediate instruction: {op}"),
            }
        }

        self.push(Instruction::new(op, Operand::Ptr(ptr), Operand::Num(num)));
    }

    /// Emit an address computation against a label, typically
    /// `Lea reg, [label]`.
    ///
    /// The label's address is only resolved downstream, so the destination
    /// becomes untrackable; nothing else is touched.
    pub fn emit_reg_label(&mut self, op: Opcode, reg: Reg, label: LabelId, disp: i32) {
        if self.optimize {
            self.invalidate_dependent(reg);
            self.gen_reg[reg.index()] = Operand::None;
        }

        self.push(Instruction::new(
            op,
            Operand::Reg(reg),
            Operand::PtrLabel { label, disp },
        ));
    }
}
