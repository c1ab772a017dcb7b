//! Optimizing x86 code emitter for the Cinder JIT backend.
//!
//! The crate sits between the IR translator and the machine-code encoder.
//! The translator drives an [`Emitter`] with one `emit_*` call per
//! architectural instruction; the emitter appends symbolic
//! [`cinder_asm::Instruction`] records while a single-pass peephole
//! optimizer (constant and copy propagation, address folding, redundant
//! load elimination, dead-store retirement) rewrites or drops requests
//! against an abstract model of the machine. The model never crosses a
//! control-flow join it cannot see through: labels marked as barriers,
//! calls, returns and explicit [`Emitter::set_look_behind`] boundaries
//! discard it wholesale.
//!
//! The optimizer is observationally transparent: executing the emitted
//! stream (skipping retired records) leaves the same registers and memory
//! as executing the stream a disabled optimizer would have produced.

#![warn(missing_docs)]

pub mod consts;
pub mod verify;

mod emitter;

pub use emitter::{Emitter, EmitterConfig};

/// Commonly imported items, re-exported in one place the way embedders
/// consume them.
pub mod prelude {
    pub use crate::consts::MEMORY_STATE_SIZE;
    pub use crate::emitter::{Emitter, EmitterConfig};
    pub use crate::verify::{verify, VerifyError};
    pub use cinder_asm::{
        InstrFlags, Instruction, LabelId, Opcode, Operand, Ptr, Reg, Size, XmmReg,
    };
}
