//! Integer arithmetic, logic, shift, compare and M-extension operations.

/// Two-operand ALU function shared by register and immediate forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum AluOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Sll,
    Srl,
    Sra,
    Slt,
    Sltu,
    Mul,
    Mulh,
    Mulhsu,
    Mulhu,
    Div,
    Divu,
    Rem,
    Remu,
}

impl AluOp {
    /// Computes `a op b` with 32-bit wraparound.
    ///
    /// Shift amounts use the low five bits of `b`. Division by zero yields all
    /// ones for the quotient and the dividend for the remainder; signed
    /// overflow (`i32::MIN / -1`) yields `i32::MIN` and remainder zero.
    #[must_use]
    #[allow(
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    pub const fn apply(self, a: u32, b: u32) -> u32 {
        let shamt = b & 0x1F;
        match self {
            Self::Add => a.wrapping_add(b),
            Self::Sub => a.wrapping_sub(b),
            Self::And => a & b,
            Self::Or => a | b,
            Self::Xor => a ^ b,
            Self::Sll => a << shamt,
            Self::Srl => a >> shamt,
            Self::Sra => ((a as i32) >> shamt) as u32,
            Self::Slt => ((a as i32) < (b as i32)) as u32,
            Self::Sltu => (a < b) as u32,
            Self::Mul => a.wrapping_mul(b),
            Self::Mulh => (((a as i32 as i64) * (b as i32 as i64)) >> 32) as u32,
            Self::Mulhsu => (((a as i32 as i64) * (b as i64)) >> 32) as u32,
            Self::Mulhu => (((a as u64) * (b as u64)) >> 32) as u32,
            Self::Div => {
                if b == 0 {
                    u32::MAX
                } else {
                    (a as i32).wrapping_div(b as i32) as u32
                }
            }
            Self::Divu => {
                if b == 0 {
                    u32::MAX
                } else {
                    a / b
                }
            }
            Self::Rem => {
                if b == 0 {
                    a
                } else {
                    (a as i32).wrapping_rem(b as i32) as u32
                }
            }
            Self::Remu => {
                if b == 0 {
                    a
                } else {
                    a % b
                }
            }
        }
    }
}
