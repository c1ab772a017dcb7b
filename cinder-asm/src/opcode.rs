use core::fmt;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
/// Opcode of an emitted instruction.
///
/// The set covers exactly what the upstream translator produces. Operand
/// shapes live in the [`crate::Instruction`] record, not here; the same
/// opcode may legally appear with several shapes (`Mov r, imm` /
/// `Mov r, r` / `Mov r, [mem]` / `Mov [mem], r`).
///
/// Opcodes without a `64` suffix operate on 32 bits; the `64` variants exist
/// only where the translator needs the full width (pointer moves, pointer
/// arithmetic).
pub enum Opcode {
    /// Deleted instruction. Kept in place so buffer indices stay stable;
    /// encoders skip it.
    #[default]
    None,

    /// 32-bit move.
    Mov,
    /// 64-bit move.
    Mov64,
    /// Move with sign extension.
    Movsx,
    /// Address computation without a memory access.
    Lea,
    /// Scalar single-precision move.
    Movss,
    /// Scalar double-precision move.
    Movsd,

    /// 32-bit addition.
    Add,
    /// 64-bit addition.
    Add64,
    /// 32-bit subtraction.
    Sub,
    /// 64-bit subtraction.
    Sub64,
    /// Signed multiplication.
    Imul,
    /// 64-bit signed multiplication.
    Imul64,
    /// Signed division of `edx:eax`.
    Idiv,
    /// Two's complement negation.
    Neg,
    /// Bitwise complement.
    Not,
    /// Bitwise and.
    And,
    /// 64-bit bitwise and.
    And64,
    /// Bitwise or.
    Or,
    /// 64-bit bitwise or.
    Or64,
    /// Bitwise exclusive or.
    Xor,
    /// 64-bit bitwise exclusive or.
    Xor64,

    /// Arithmetic shift left; count pinned to `ecx`.
    Sal,
    /// 64-bit arithmetic shift left.
    Sal64,
    /// Arithmetic shift right; count pinned to `ecx`.
    Sar,
    /// 64-bit arithmetic shift right.
    Sar64,

    /// Compare.
    Cmp,
    /// Bit test.
    Test,

    /// Set byte if less.
    Setl,
    /// Set byte if greater.
    Setg,
    /// Set byte if less or equal.
    Setle,
    /// Set byte if greater or equal.
    Setge,
    /// Set byte if equal.
    Sete,
    /// Set byte if not equal.
    Setne,
    /// Set byte if zero.
    Setz,
    /// Set byte if not zero.
    Setnz,

    /// Unconditional jump.
    Jmp,
    /// Jump if above.
    Ja,
    /// Jump if above or equal.
    Jae,
    /// Jump if below.
    Jb,
    /// Jump if below or equal.
    Jbe,
    /// Jump if equal.
    Je,
    /// Jump if greater.
    Jg,
    /// Jump if less.
    Jl,
    /// Jump if not equal.
    Jne,
    /// Jump if parity.
    Jp,
    /// Jump if no parity.
    Jnp,
    /// Jump if greater or equal.
    Jge,
    /// Jump if less or equal.
    Jle,
    /// Procedure call.
    Call,
    /// Procedure return; implicitly reads the `eax`/`edx` return pair.
    Ret,

    /// Scalar double-precision addition.
    Addsd,
    /// Scalar double-precision subtraction.
    Subsd,
    /// Scalar double-precision multiplication.
    Mulsd,
    /// Scalar double-precision division.
    Divsd,
    /// Scalar double-precision compare for equality.
    Cmpeqsd,
    /// Scalar double-precision compare for less-than.
    Cmpltsd,
    /// Scalar double-precision compare for less-or-equal.
    Cmplesd,
    /// Scalar double-precision compare for inequality.
    Cmpneqsd,
    /// Convert single to double precision.
    Cvtss2sd,
    /// Convert double to single precision.
    Cvtsd2ss,
    /// Convert a 32-bit integer to double precision.
    Cvtsi2sd,

    /// Repeated doubleword copy; implicitly reads `ecx`, `esi`, `edi`.
    RepMovsd,

    /// Label definition.
    Label,
    /// 32-bit addressing mode marker for the encoder.
    Use32,
}

impl Opcode {
    /// Whether the opcode transfers control to a label, conditionally or
    /// not. `Call` is excluded; it returns into the following instruction.
    pub const fn is_jump(&self) -> bool {
        use Opcode::*;

        matches!(
            self,
            Jmp | Ja | Jae | Jb | Jbe | Je | Jg | Jl | Jne | Jp | Jnp | Jge | Jle
        )
    }

    /// Whether the opcode is a conditional byte set.
    pub const fn is_setcc(&self) -> bool {
        use Opcode::*;

        matches!(self, Setl | Setg | Setle | Setge | Sete | Setne | Setz | Setnz)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Opcode::*;

        let name = match self {
            None => "(none)",
            Mov => "mov",
            Mov64 => "mov",
            Movsx => "movsx",
            Lea => "lea",
            Movss => "movss",
            Movsd => "movsd",
            Add => "add",
            Add64 => "add",
            Sub => "sub",
            Sub64 => "sub",
            Imul => "imul",
            Imul64 => "imul",
            Idiv => "idiv",
            Neg => "neg",
            Not => "not",
            And => "and",
            And64 => "and",
            Or => "or",
            Or64 => "or",
            Xor => "xor",
            Xor64 => "xor",
            Sal => "sal",
            Sal64 => "sal",
            Sar => "sar",
            Sar64 => "sar",
            Cmp => "cmp",
            Test => "test",
            Setl => "setl",
            Setg => "setg",
            Setle => "setle",
            Setge => "setge",
            Sete => "sete",
            Setne => "setne",
            Setz => "setz",
            Setnz => "setnz",
            Jmp => "jmp",
            Ja => "ja",
            Jae => "jae",
            Jb => "jb",
            Jbe => "jbe",
            Je => "je",
            Jg => "jg",
            Jl => "jl",
            Jne => "jne",
            Jp => "jp",
            Jnp => "jnp",
            Jge => "jge",
            Jle => "jle",
            Call => "call",
            Ret => "ret",
            Addsd => "addsd",
            Subsd => "subsd",
            Mulsd => "mulsd",
            Divsd => "divsd",
            Cmpeqsd => "cmpeqsd",
            Cmpltsd => "cmpltsd",
            Cmplesd => "cmplesd",
            Cmpneqsd => "cmpneqsd",
            Cvtss2sd => "cvtss2sd",
            Cvtsd2ss => "cvtsd2ss",
            Cvtsi2sd => "cvtsi2sd",
            RepMovsd => "rep movsd",
            Label => "label",
            Use32 => "use32",
        };

        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_opcode_has_a_mnemonic() {
        for op in Opcode::iter() {
            assert!(!op.to_string().is_empty());
        }
    }

    #[test]
    fn jump_classification() {
        assert!(Opcode::Jmp.is_jump());
        assert!(Opcode::Jle.is_jump());
        assert!(!Opcode::Call.is_jump());
        assert!(!Opcode::Ret.is_jump());
        assert!(!Opcode::Label.is_jump());

        assert_eq!(8, Opcode::iter().filter(Opcode::is_setcc).count());
        assert_eq!(13, Opcode::iter().filter(Opcode::is_jump).count());
    }
}
