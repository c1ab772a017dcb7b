//! Control-flow entry points: zero-operand instructions, jumps and calls,
//! label definitions and the look-behind barrier.

use super::Emitter;

use cinder_asm::{InstrFlags, Instruction, LabelId, Opcode, Operand, Reg};

impl Emitter {
    /// Emit an instruction without operands: `Ret`, `RepMovsd` or the
    /// `Use32` encoder marker.
    ///
    /// # Panics
    ///
    /// Any other opcode; `RepMovsd` when `ecx` does not hold a known count.
    pub fn emit_op(&mut self, op: Opcode) {
        if self.optimize {
            match op {
                Opcode::Ret => {
                    self.invalidate_state();

                    // The return pair escapes to the caller.
                    self.read_gen(Reg::Eax);
                    self.read_gen(Reg::Edx);
                }
                Opcode::RepMovsd => {
                    assert!(
                        matches!(self.known_reg(Reg::Ecx), Operand::Num(_)),
                        "rep movsd emitted without a known ecx count"
                    );

                    self.invalidate_state();

                    self.read_gen(Reg::Ecx);
                    self.read_gen(Reg::Esi);
                    self.read_gen(Reg::Edi);
                }
                Opcode::Use32 => (),
                _ => panic!("invalid zero-operand instruction: {op}"),
            }
        }

        self.push(Instruction::plain(op));
    }

    /// Emit a jump or a call targeting a label.
    ///
    /// `invalidate` marks targets that can also be reached from code the
    /// optimizer has not seen; the state is discarded there. A long
    /// invalidating jump additionally flushes pending dead stores first,
    /// since the unseen path may rejoin behind them.
    ///
    /// # Panics
    ///
    /// Opcodes other than the jump family and `Call`.
    pub fn emit_jump(&mut self, op: Opcode, label: LabelId, invalidate: bool, long_jump: bool) {
        if self.optimize {
            if op.is_jump() {
                if invalidate {
                    if long_jump {
                        self.kill_unread_registers();
                    }

                    self.invalidate_state();
                }
            } else if matches!(op, Opcode::Call) {
                self.kill_unread_registers();
                self.invalidate_state();
            } else {
                panic!("invalid label-target instruction: {op}");
            }
        }

        let mut flags = InstrFlags::empty();
        flags.set(InstrFlags::INVALIDATE, invalidate);
        flags.set(InstrFlags::LONG_JUMP, long_jump);

        self.push(Instruction {
            op,
            a: Operand::Label(label),
            flags,
            ..Instruction::default()
        });
    }

    /// Define a label. `invalidate` marks join points with unmodelled
    /// predecessors (targets of backward or long branches); pure
    /// fall-through markers for the encoder pass `false` and keep the
    /// state alive.
    pub fn emit_label(&mut self, label: LabelId, invalidate: bool) {
        if self.optimize && invalidate {
            self.invalidate_state();
        }

        let mut flags = InstrFlags::empty();
        flags.set(InstrFlags::INVALIDATE, invalidate);

        self.push(Instruction {
            op: Opcode::Label,
            label: Some(label),
            flags,
            ..Instruction::default()
        });
    }

    /// Toggle rewriting of previously appended records.
    ///
    /// Disabling is a hard optimization barrier: pending dead stores are
    /// flushed, the state is discarded and the current buffer position is
    /// recorded so no later rewrite reaches behind it. `esp` keeps no
    /// retirable producer across the barrier; its slot is reset.
    /// Re-enabling changes no state.
    pub fn set_look_behind(&mut self, allow: bool) {
        self.look_behind = allow;

        if self.optimize && !allow {
            self.kill_unread_registers();

            self.last_invalidate = self.buf.len();
            self.invalidate_state();

            self.gen_reg_update[Reg::Esp.index()] = 0;
        }
    }

    /// Append a comment record. Encoders skip it; listings show it.
    pub fn emit_comment(&mut self, text: &'static str) {
        self.push(Instruction {
            comment: Some(text),
            ..Instruction::default()
        });
    }
}
