use crate::reg::{Reg, XmmReg};
use crate::LabelId;

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
/// Access width of a memory operand.
pub enum Size {
    /// No meaningful width; valid only for address computations (`Lea`).
    None,
    /// 1 byte.
    Byte,
    /// 2 bytes.
    Word,
    /// 4 bytes.
    Dword,
    /// 8 bytes.
    Qword,
}

impl Size {
    /// Width of the access in bytes.
    ///
    /// # Panics
    ///
    /// `Size::None` has no width; asking for one means the upstream
    /// translator produced a size-less pointer in a sized context.
    pub fn bytes(self) -> i64 {
        match self {
            Size::Byte => 1,
            Size::Word => 2,
            Size::Dword => 4,
            Size::Qword => 8,
            Size::None => panic!("size-less pointer used in a sized context"),
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self {
            Size::None => "",
            Size::Byte => "byte ",
            Size::Word => "word ",
            Size::Dword => "dword ",
            Size::Qword => "qword ",
        };

        f.write_str(prefix)
    }
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Memory operand in `size [base + index * scale + disp]` form.
pub struct Ptr {
    /// Access width.
    pub size: Size,
    /// Base register, if any.
    pub base: Option<Reg>,
    /// Index register, if any.
    pub index: Option<Reg>,
    /// Index multiplier; one of 1, 2, 4 or 8. Meaningless without an index.
    pub scale: i32,
    /// Constant displacement.
    pub disp: i32,
}

impl Ptr {
    /// Memory operand addressed off a single base register.
    pub const fn new(size: Size, base: Reg, disp: i32) -> Self {
        Self {
            size,
            base: Some(base),
            index: None,
            scale: 1,
            disp,
        }
    }

    /// Memory operand with the full scaled-index form.
    pub const fn sib(size: Size, index: Reg, scale: i32, base: Reg, disp: i32) -> Self {
        Self {
            size,
            base: Some(base),
            index: Some(index),
            scale,
            disp,
        }
    }

    /// Memory operand at an absolute address.
    pub const fn absolute(size: Size, disp: i32) -> Self {
        Self {
            size,
            base: None,
            index: None,
            scale: 1,
            disp,
        }
    }

    /// Width of the access in bytes. See [`Size::bytes`].
    pub fn bytes(&self) -> i64 {
        self.size.bytes()
    }

    /// Whether the address computation reads `reg`.
    pub fn references(&self, reg: Reg) -> bool {
        self.base == Some(reg) || self.index == Some(reg)
    }

    /// Whether this address names a constant pool entry.
    ///
    /// Constant pool memory is immutable; stores never invalidate it.
    pub fn is_const_pool(&self) -> bool {
        self.base == Some(Reg::R14) && self.index.is_none()
    }

    /// Whether the byte ranges of `self` and `other` are statically known
    /// not to overlap.
    ///
    /// Only index-free operands sharing the same base are comparable; any
    /// other pair may alias.
    pub fn provably_disjoint(&self, other: &Ptr) -> bool {
        if self.index.is_some() || other.index.is_some() || self.base != other.base {
            return false;
        }

        let a = self.disp as i64;
        let b = other.disp as i64;

        a + self.size.bytes() <= b || b + other.size.bytes() <= a
    }

    /// Whether a write through `other` can change the value read through
    /// `self`.
    pub fn may_alias(&self, other: &Ptr) -> bool {
        !self.provably_disjoint(other)
    }
}

impl PartialEq for Ptr {
    fn eq(&self, other: &Self) -> bool {
        // The scale only participates when an index register is present;
        // `[eax]` with scale 1 and `[eax]` with a leftover scale 4 name the
        // same location.
        self.size == other.size
            && self.base == other.base
            && self.index == other.index
            && self.disp == other.disp
            && (self.index.is_none() || self.scale == other.scale)
    }
}

impl Eq for Ptr {}

impl fmt::Display for Ptr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.size)?;

        let mut leading = true;

        if let Some(base) = self.base {
            write!(f, "{base}")?;
            leading = false;
        }

        if let Some(index) = self.index {
            if !leading {
                f.write_str("+")?;
            }
            write!(f, "{index}*{}", self.scale)?;
            leading = false;
        }

        if self.disp != 0 || leading {
            if leading {
                write!(f, "{}", self.disp)?;
            } else if self.disp < 0 {
                write!(f, "-{}", -(self.disp as i64))?;
            } else {
                write!(f, "+{}", self.disp)?;
            }
        }

        f.write_str("]")
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// A single instruction operand.
///
/// The same type doubles as the *known value* of a register in the
/// optimizer's state: `Num`/`Imm64` mean the register holds that constant,
/// `Reg`/`Xmm` that it mirrors another register, `Ptr` that it holds the
/// value last transferred through that address, and `PtrLabel` that it holds
/// something real which is no longer tracked precisely.
pub enum Operand {
    /// Absent operand.
    #[default]
    None,
    /// General-purpose register.
    Reg(Reg),
    /// Xmm register.
    Xmm(XmmReg),
    /// 32-bit immediate, signed semantics.
    Num(i32),
    /// 64-bit immediate.
    Imm64(u64),
    /// Jump target.
    Label(LabelId),
    /// Label used as an address-computation input.
    PtrLabel {
        /// Referenced label.
        label: LabelId,
        /// Constant offset from the label.
        disp: i32,
    },
    /// Memory operand.
    Ptr(Ptr),
}

impl Operand {
    /// Whether the operand is absent.
    pub const fn is_none(&self) -> bool {
        matches!(self, Operand::None)
    }

    /// Whether the operand value depends on the general-purpose register
    /// `reg`, either by naming it or by addressing memory through it.
    pub fn references(&self, reg: Reg) -> bool {
        match self {
            Operand::Reg(r) => *r == reg,
            Operand::Ptr(ptr) => ptr.references(reg),
            _ => false,
        }
    }
}

impl From<Reg> for Operand {
    fn from(reg: Reg) -> Self {
        Operand::Reg(reg)
    }
}

impl From<XmmReg> for Operand {
    fn from(reg: XmmReg) -> Self {
        Operand::Xmm(reg)
    }
}

impl From<Ptr> for Operand {
    fn from(ptr: Ptr) -> Self {
        Operand::Ptr(ptr)
    }
}

impl From<i32> for Operand {
    fn from(num: i32) -> Self {
        Operand::Num(num)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::None => Ok(()),
            Operand::Reg(reg) => reg.fmt(f),
            Operand::Xmm(reg) => reg.fmt(f),
            Operand::Num(num) => num.fmt(f),
            Operand::Imm64(num) => write!(f, "{num:#x}"),
            Operand::Label(label) => write!(f, "label_{label}"),
            Operand::PtrLabel { label, disp } if *disp == 0 => write!(f, "[label_{label}]"),
            Operand::PtrLabel { label, disp } => write!(f, "[label_{label}{disp:+}]"),
            Operand::Ptr(ptr) => ptr.fmt(f),
        }
    }
}
