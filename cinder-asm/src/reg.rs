use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
/// General-purpose register of the x86-64 target.
///
/// Registers keep their 32-bit names; the operation width is carried by the
/// opcode (`Mov` vs `Mov64`), not by the register operand.
///
/// Some registers have a fixed role in the emitted code:
///
/// | Register | Role |
/// |---|---|
/// | `Esp` | stack pointer; frame manipulation is opaque to the optimizer |
/// | `Ecx` | shift count for `Sal`/`Sar` |
/// | `Eax`, `Edx` | ABI return pair, implicitly read by `Ret` |
/// | `R14` | constant pool base; memory below it is immutable |
pub enum Reg {
    /// Accumulator.
    Eax = 0x00,
    /// Counter; architecturally pinned shift-count register.
    Ecx = 0x01,
    /// Data; high half of the ABI return pair.
    Edx = 0x02,
    /// Base.
    Ebx = 0x03,
    /// Stack pointer. Exempt from known-value tracking.
    Esp = 0x04,
    /// Frame base pointer.
    Ebp = 0x05,
    /// Source index for string operations.
    Esi = 0x06,
    /// Destination index for string operations.
    Edi = 0x07,
    /// Extended register 8.
    R8 = 0x08,
    /// Extended register 9.
    R9 = 0x09,
    /// Extended register 10.
    R10 = 0x0a,
    /// Extended register 11.
    R11 = 0x0b,
    /// Extended register 12.
    R12 = 0x0c,
    /// Extended register 13.
    R13 = 0x0d,
    /// Constant pool base. Addresses based on it are read-only.
    R14 = 0x0e,
    /// Extended register 15.
    R15 = 0x0f,
}

impl Reg {
    /// Number of general-purpose registers.
    pub const COUNT: usize = 16;

    /// Position of the register in the architectural register file.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reg::Eax => "eax",
            Reg::Ecx => "ecx",
            Reg::Edx => "edx",
            Reg::Ebx => "ebx",
            Reg::Esp => "esp",
            Reg::Ebp => "ebp",
            Reg::Esi => "esi",
            Reg::Edi => "edi",
            Reg::R8 => "r8",
            Reg::R9 => "r9",
            Reg::R10 => "r10",
            Reg::R11 => "r11",
            Reg::R12 => "r12",
            Reg::R13 => "r13",
            Reg::R14 => "r14",
            Reg::R15 => "r15",
        };

        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
/// SSE register used for scalar floating-point operations.
#[allow(missing_docs)]
pub enum XmmReg {
    Xmm0 = 0x00,
    Xmm1 = 0x01,
    Xmm2 = 0x02,
    Xmm3 = 0x03,
    Xmm4 = 0x04,
    Xmm5 = 0x05,
    Xmm6 = 0x06,
    Xmm7 = 0x07,
    Xmm8 = 0x08,
    Xmm9 = 0x09,
    Xmm10 = 0x0a,
    Xmm11 = 0x0b,
    Xmm12 = 0x0c,
    Xmm13 = 0x0d,
    Xmm14 = 0x0e,
    Xmm15 = 0x0f,
}

impl XmmReg {
    /// Number of xmm registers.
    pub const COUNT: usize = 16;

    /// Position of the register in the xmm register file.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for XmmReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "xmm{}", self.index())
    }
}
