use crate::opcode::Opcode;
use crate::operand::Operand;

use core::fmt;

/// Identifier of a label within one emission stream.
///
/// Label ids are allocated by the upstream translator; the emitter only
/// transports them and the downstream encoder resolves them to offsets.
pub type LabelId = u32;

bitflags::bitflags! {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    /// Auxiliary control-flow properties of an instruction record.
    pub struct InstrFlags: u8 {
        /// The record is an optimization barrier: the optimizer state was
        /// discarded when it was emitted.
        const INVALIDATE = 0x01;
        /// The jump may span more than a basic block; the encoder must not
        /// assume a short displacement.
        const LONG_JUMP = 0x02;
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// One record of the emitted instruction stream.
///
/// Records are append-only: an optimization may later retire a record by
/// resetting its opcode to [`Opcode::None`], but records are never reordered
/// or removed, so buffer indices stay valid for the whole stream lifetime.
pub struct Instruction {
    /// Instruction opcode; [`Opcode::None`] for retired records.
    pub op: Opcode,
    /// First operand (destination for two-operand forms).
    pub a: Operand,
    /// Second operand.
    pub b: Operand,
    /// Control-flow properties.
    pub flags: InstrFlags,
    /// Defined label for [`Opcode::Label`] records.
    pub label: Option<LabelId>,
    /// Free-form annotation; shows in listings, ignored by encoders.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub comment: Option<&'static str>,
}

impl Instruction {
    /// Record with an opcode and no operands.
    pub fn plain(op: Opcode) -> Self {
        Self {
            op,
            ..Self::default()
        }
    }

    /// Record with an opcode and operands.
    pub fn new(op: Opcode, a: Operand, b: Operand) -> Self {
        Self {
            op,
            a,
            b,
            ..Self::default()
        }
    }

    /// Whether the record was retired by an optimization and carries no
    /// payload for the encoder.
    pub const fn is_deleted(&self) -> bool {
        matches!(self.op, Opcode::None) && self.comment.is_none()
    }

    /// Whether the record is a comment-only annotation.
    pub const fn is_comment(&self) -> bool {
        matches!(self.op, Opcode::None) && self.comment.is_some()
    }

    /// Retire the record, leaving a hole the encoder skips.
    pub fn delete(&mut self) {
        self.op = Opcode::None;
        self.a = Operand::None;
        self.b = Operand::None;
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_comment() {
            return write!(f, "; {}", self.comment.unwrap_or_default());
        }

        match self.op {
            Opcode::None => f.write_str("(elided)"),
            Opcode::Label => write!(f, "label_{}:", self.label.unwrap_or_default()),
            op => {
                write!(f, "  {op}")?;

                if !self.a.is_none() {
                    write!(f, " {}", self.a)?;
                }

                if !self.b.is_none() {
                    write!(f, ", {}", self.b)?;
                }

                Ok(())
            }
        }
    }
}
