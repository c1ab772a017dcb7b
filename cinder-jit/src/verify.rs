//! Structural verification of an emitted instruction stream.
//!
//! The checks mirror what the downstream encoder assumes: every referenced
//! label is defined exactly once, memory operands are encodable, and sized
//! contexts carry a size. The emitter never runs this on its own; it is an
//! assertion layer for tests and for embedders that want to fail before
//! encoding instead of during it.

use crate::emitter::Emitter;

use cinder_asm::{Instruction, LabelId, Opcode, Operand, Size};

use std::collections::HashMap;

use itertools::Itertools;
use thiserror::Error;

/// Structural defects [`verify`] reports.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    /// A label record without a label id.
    #[error("label record at {index} carries no label id")]
    MissingLabelId {
        /// Buffer position of the malformed record.
        index: usize,
    },
    /// Two label records define the same id.
    #[error("label {label} is defined at both {first} and {second}")]
    DuplicateLabel {
        /// The doubly defined label.
        label: LabelId,
        /// Buffer position of the first definition.
        first: usize,
        /// Buffer position of the second definition.
        second: usize,
    },
    /// An instruction references a label no record defines.
    #[error("instruction at {index} references undefined label {label}")]
    UndefinedLabel {
        /// Buffer position of the referencing instruction.
        index: usize,
        /// The undefined label.
        label: LabelId,
    },
    /// A memory operand with a scale the ModR/M encoding cannot express.
    #[error("instruction at {index} has unencodable scale {scale}")]
    InvalidScale {
        /// Buffer position of the offending instruction.
        index: usize,
        /// The rejected scale.
        scale: i32,
    },
    /// A size-less memory operand outside an address computation.
    #[error("instruction at {index} accesses memory without a size")]
    UnsizedMemoryAccess {
        /// Buffer position of the offending instruction.
        index: usize,
    },
}

/// Check an instruction stream against the encoder's structural
/// assumptions.
///
/// Retired records are skipped like an encoder would skip them.
pub fn verify(instructions: &[Instruction]) -> Result<(), VerifyError> {
    let mut defined = HashMap::new();

    for index in instructions
        .iter()
        .positions(|record| matches!(record.op, Opcode::Label))
    {
        let Some(label) = instructions[index].label else {
            return Err(VerifyError::MissingLabelId { index });
        };

        if let Some(first) = defined.insert(label, index) {
            return Err(VerifyError::DuplicateLabel {
                label,
                first,
                second: index,
            });
        }
    }

    for (index, record) in instructions.iter().enumerate() {
        if record.is_deleted() || record.is_comment() {
            continue;
        }

        for operand in [record.a, record.b] {
            match operand {
                // `PtrLabel` operands are exempt: address-of-label
                // computations may point into streams emitted separately.
                Operand::Label(label) => {
                    if !defined.contains_key(&label) {
                        return Err(VerifyError::UndefinedLabel { index, label });
                    }
                }
                Operand::Ptr(ptr) => {
                    if !matches!(ptr.scale, 1 | 2 | 4 | 8) {
                        return Err(VerifyError::InvalidScale {
                            index,
                            scale: ptr.scale,
                        });
                    }

                    if matches!(ptr.size, Size::None) && !matches!(record.op, Opcode::Lea) {
                        return Err(VerifyError::UnsizedMemoryAccess { index });
                    }
                }
                _ => (),
            }
        }
    }

    Ok(())
}

impl Emitter {
    /// Run [`verify`] over the emitted stream.
    pub fn verify(&self) -> Result<(), VerifyError> {
        verify(self.instructions())
    }
}
