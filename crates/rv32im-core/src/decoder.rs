//! Instruction decoder for RV32IM.
//!
//! Classifies a raw word through the encoding table and splits it into the
//! operand fields of its format. Decoding never touches machine state.

use crate::encoding::{
    classify, funct3, funct7, imm_b, imm_i, imm_j, imm_s, imm_u, opcode, rd_field, rs1_field,
    rs2_field, Mnemonic, EBREAK_WORD,
};
use crate::state::Register;
use crate::DecodeError;

/// Register-register operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub struct RType {
    pub opcode: u8,
    pub rd: Register,
    pub funct3: u8,
    pub rs1: Register,
    pub rs2: Register,
    pub funct7: u8,
}

impl RType {
    /// Extracts R-type fields from `word`.
    #[must_use]
    pub const fn from_word(word: u32) -> Self {
        Self {
            opcode: opcode(word),
            rd: Register::from_u5(rd_field(word)),
            funct3: funct3(word),
            rs1: Register::from_u5(rs1_field(word)),
            rs2: Register::from_u5(rs2_field(word)),
            funct7: funct7(word),
        }
    }

    /// Re-encodes the fields into an instruction word.
    #[must_use]
    pub const fn encode(self) -> u32 {
        ((self.funct7 as u32) << 25)
            | (self.rs2.number() << 20)
            | (self.rs1.number() << 15)
            | ((self.funct3 as u32) << 12)
            | (self.rd.number() << 7)
            | self.opcode as u32
    }
}

/// Register-immediate operands. `imm` is sign-extended from 12 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub struct IType {
    pub opcode: u8,
    pub rd: Register,
    pub funct3: u8,
    pub rs1: Register,
    pub imm: u32,
    /// Bits 31..25; selects `srli`/`srai` for shift-immediates.
    pub funct7: u8,
}

impl IType {
    /// Extracts I-type fields from `word`.
    #[must_use]
    pub const fn from_word(word: u32) -> Self {
        Self {
            opcode: opcode(word),
            rd: Register::from_u5(rd_field(word)),
            funct3: funct3(word),
            rs1: Register::from_u5(rs1_field(word)),
            imm: imm_i(word),
            funct7: funct7(word),
        }
    }

    /// Shift amount for shift-immediate forms.
    #[must_use]
    pub const fn shamt(self) -> u32 {
        self.imm & 0x1F
    }

    /// Re-encodes the fields into an instruction word.
    #[must_use]
    pub const fn encode(self) -> u32 {
        ((self.imm & 0xFFF) << 20)
            | (self.rs1.number() << 15)
            | ((self.funct3 as u32) << 12)
            | (self.rd.number() << 7)
            | self.opcode as u32
    }
}

/// Store operands. `imm` is sign-extended from 12 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub struct SType {
    pub opcode: u8,
    pub funct3: u8,
    pub rs1: Register,
    pub rs2: Register,
    pub imm: u32,
}

impl SType {
    /// Extracts S-type fields from `word`.
    #[must_use]
    pub const fn from_word(word: u32) -> Self {
        Self {
            opcode: opcode(word),
            funct3: funct3(word),
            rs1: Register::from_u5(rs1_field(word)),
            rs2: Register::from_u5(rs2_field(word)),
            imm: imm_s(word),
        }
    }

    /// Re-encodes the fields into an instruction word.
    #[must_use]
    pub const fn encode(self) -> u32 {
        (((self.imm >> 5) & 0x7F) << 25)
            | (self.rs2.number() << 20)
            | (self.rs1.number() << 15)
            | ((self.funct3 as u32) << 12)
            | ((self.imm & 0x1F) << 7)
            | self.opcode as u32
    }
}

/// Conditional-branch operands. `imm` is sign-extended from 13 bits, bit 0 clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub struct BType {
    pub opcode: u8,
    pub funct3: u8,
    pub rs1: Register,
    pub rs2: Register,
    pub imm: u32,
}

impl BType {
    /// Extracts B-type fields from `word`.
    #[must_use]
    pub const fn from_word(word: u32) -> Self {
        Self {
            opcode: opcode(word),
            funct3: funct3(word),
            rs1: Register::from_u5(rs1_field(word)),
            rs2: Register::from_u5(rs2_field(word)),
            imm: imm_b(word),
        }
    }

    /// Re-encodes the fields into an instruction word.
    #[must_use]
    pub const fn encode(self) -> u32 {
        (((self.imm >> 12) & 0x1) << 31)
            | (((self.imm >> 5) & 0x3F) << 25)
            | (self.rs2.number() << 20)
            | (self.rs1.number() << 15)
            | ((self.funct3 as u32) << 12)
            | (((self.imm >> 1) & 0xF) << 8)
            | (((self.imm >> 11) & 0x1) << 7)
            | self.opcode as u32
    }
}

/// Upper-immediate operands. `imm` holds bits 31..12, low 12 bits zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub struct UType {
    pub opcode: u8,
    pub rd: Register,
    pub imm: u32,
}

impl UType {
    /// Extracts U-type fields from `word`.
    #[must_use]
    pub const fn from_word(word: u32) -> Self {
        Self {
            opcode: opcode(word),
            rd: Register::from_u5(rd_field(word)),
            imm: imm_u(word),
        }
    }

    /// Re-encodes the fields into an instruction word.
    #[must_use]
    pub const fn encode(self) -> u32 {
        (self.imm & 0xFFFF_F000) | (self.rd.number() << 7) | self.opcode as u32
    }
}

/// Jump operands. `imm` is sign-extended from 21 bits, bit 0 clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub struct JType {
    pub opcode: u8,
    pub rd: Register,
    pub imm: u32,
}

impl JType {
    /// Extracts J-type fields from `word`.
    #[must_use]
    pub const fn from_word(word: u32) -> Self {
        Self {
            opcode: opcode(word),
            rd: Register::from_u5(rd_field(word)),
            imm: imm_j(word),
        }
    }

    /// Re-encodes the fields into an instruction word.
    #[must_use]
    pub const fn encode(self) -> u32 {
        (((self.imm >> 20) & 0x1) << 31)
            | (((self.imm >> 1) & 0x3FF) << 21)
            | (((self.imm >> 11) & 0x1) << 20)
            | (((self.imm >> 12) & 0xFF) << 12)
            | (self.rd.number() << 7)
            | self.opcode as u32
    }
}

macro_rules! operations {
    ($($variant:ident($format:ident)),+ $(,)?) => {
        /// Decoded instruction: one variant per mnemonic, carrying its format's fields.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
        #[allow(missing_docs)]
        pub enum Operation {
            $($variant($format)),+
        }

        impl Operation {
            /// Returns the mnemonic of this operation.
            #[must_use]
            pub const fn mnemonic(self) -> Mnemonic {
                match self {
                    $(Self::$variant(_) => Mnemonic::$variant),+
                }
            }

            /// Re-encodes this operation back to its 32-bit instruction word.
            #[must_use]
            pub const fn encode(self) -> u32 {
                match self {
                    $(Self::$variant(fields) => fields.encode()),+
                }
            }

            const fn with_fields(mnemonic: Mnemonic, word: u32) -> Self {
                match mnemonic {
                    $(Mnemonic::$variant => Self::$variant($format::from_word(word))),+
                }
            }
        }
    };
}

operations! {
    Add(RType),
    Sub(RType),
    And(RType),
    Or(RType),
    Xor(RType),
    Sll(RType),
    Srl(RType),
    Sra(RType),
    Slt(RType),
    Sltu(RType),
    Mul(RType),
    Mulh(RType),
    Mulhsu(RType),
    Mulhu(RType),
    Div(RType),
    Divu(RType),
    Rem(RType),
    Remu(RType),
    Addi(IType),
    Xori(IType),
    Ori(IType),
    Andi(IType),
    Slti(IType),
    Sltiu(IType),
    Slli(IType),
    Srli(IType),
    Srai(IType),
    Lb(IType),
    Lh(IType),
    Lw(IType),
    Lbu(IType),
    Lhu(IType),
    Jalr(IType),
    Ebreak(IType),
    Sb(SType),
    Sh(SType),
    Sw(SType),
    Beq(BType),
    Bne(BType),
    Blt(BType),
    Bge(BType),
    Bltu(BType),
    Bgeu(BType),
    Lui(UType),
    Auipc(UType),
    Jal(JType),
}

/// Instruction decoder for RV32I plus the M extension.
///
/// Pure: the result depends only on the instruction word.
pub struct Decoder;

impl Decoder {
    /// Decodes a 32-bit instruction word.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnknownEncoding`] when the `(opcode, funct3, funct7)`
    /// combination is unassigned, or when a system-opcode word is anything other
    /// than the exact `ebreak` encoding. The error's address is zero; the fetch
    /// stage attaches the real one with [`DecodeError::at`].
    pub fn decode(word: u32) -> Result<Operation, DecodeError> {
        let unknown = DecodeError::UnknownEncoding { address: 0, word };
        let mnemonic = classify(word).ok_or(unknown)?;
        if mnemonic == Mnemonic::Ebreak && word != EBREAK_WORD {
            return Err(unknown);
        }
        Ok(Operation::with_fields(mnemonic, word))
    }
}
