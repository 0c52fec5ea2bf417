//! Instruction field layout, immediate reconstruction and the mnemonic table.

/// `lui` major opcode.
pub const OPCODE_LUI: u8 = 0x37;
/// `auipc` major opcode.
pub const OPCODE_AUIPC: u8 = 0x17;
/// `jal` major opcode.
pub const OPCODE_JAL: u8 = 0x6F;
/// `jalr` major opcode.
pub const OPCODE_JALR: u8 = 0x67;
/// Conditional branch major opcode.
pub const OPCODE_BRANCH: u8 = 0x63;
/// Load major opcode.
pub const OPCODE_LOAD: u8 = 0x03;
/// Store major opcode.
pub const OPCODE_STORE: u8 = 0x23;
/// Register-immediate ALU major opcode.
pub const OPCODE_OP_IMM: u8 = 0x13;
/// Register-register ALU major opcode (base and M extension).
pub const OPCODE_OP: u8 = 0x33;
/// System major opcode.
pub const OPCODE_SYSTEM: u8 = 0x73;

/// The only accepted `ebreak` encoding.
pub const EBREAK_WORD: u32 = 0x0010_0073;

/// `funct7` of base R-type operations and logical shifts.
pub const FUNCT7_BASE: u8 = 0x00;
/// `funct7` of `sub`, `sra` and `srai`.
pub const FUNCT7_ALT: u8 = 0x20;
/// `funct7` of the M extension.
pub const FUNCT7_MULDIV: u8 = 0x01;

/// Extracts the major opcode (bits 6..0).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn opcode(word: u32) -> u8 {
    (word & 0x7F) as u8
}

/// Extracts the `rd` field (bits 11..7).
#[must_use]
pub const fn rd_field(word: u32) -> u32 {
    (word >> 7) & 0x1F
}

/// Extracts `funct3` (bits 14..12).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn funct3(word: u32) -> u8 {
    ((word >> 12) & 0x07) as u8
}

/// Extracts the `rs1` field (bits 19..15).
#[must_use]
pub const fn rs1_field(word: u32) -> u32 {
    (word >> 15) & 0x1F
}

/// Extracts the `rs2` field (bits 24..20).
#[must_use]
pub const fn rs2_field(word: u32) -> u32 {
    (word >> 20) & 0x1F
}

/// Extracts `funct7` (bits 31..25).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn funct7(word: u32) -> u8 {
    (word >> 25) as u8
}

/// I-type immediate: bits 31..20, sign-extended from 12 bits.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub const fn imm_i(word: u32) -> u32 {
    ((word as i32) >> 20) as u32
}

/// S-type immediate: bits 31..25 ++ 11..7, sign-extended from 12 bits.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub const fn imm_s(word: u32) -> u32 {
    ((((word & 0xFE00_0000) as i32) >> 20) as u32) | ((word >> 7) & 0x1F)
}

/// B-type immediate: `{31, 7, 30..25, 11..8, 0}`, sign-extended from 13 bits.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub const fn imm_b(word: u32) -> u32 {
    ((((word & 0x8000_0000) as i32) >> 19) as u32)
        | ((word & 0x80) << 4)
        | ((word >> 20) & 0x7E0)
        | ((word >> 7) & 0x1E)
}

/// U-type immediate: bits 31..12 with the low 12 bits cleared.
#[must_use]
pub const fn imm_u(word: u32) -> u32 {
    word & 0xFFFF_F000
}

/// J-type immediate: `{31, 19..12, 20, 30..21, 0}`, sign-extended from 21 bits.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub const fn imm_j(word: u32) -> u32 {
    ((((word & 0x8000_0000) as i32) >> 11) as u32)
        | (word & 0x000F_F000)
        | ((word >> 9) & 0x800)
        | ((word >> 20) & 0x7FE)
}

/// Instruction encoding formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Format {
    R,
    I,
    S,
    B,
    U,
    J,
}

/// Every mnemonic the core recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Mnemonic {
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
    Addi,
    Xori,
    Ori,
    Andi,
    Slti,
    Sltiu,
    Slli,
    Srli,
    Srai,
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
    Jalr,
    Ebreak,
    Sb,
    Sh,
    Sw,
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    Lui,
    Auipc,
    Jal,
}

impl Mnemonic {
    /// Assembly spelling of the mnemonic.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Sll => "sll",
            Self::Srl => "srl",
            Self::Sra => "sra",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
            Self::Mul => "mul",
            Self::Mulh => "mulh",
            Self::Mulhsu => "mulhsu",
            Self::Mulhu => "mulhu",
            Self::Div => "div",
            Self::Divu => "divu",
            Self::Rem => "rem",
            Self::Remu => "remu",
            Self::Addi => "addi",
            Self::Xori => "xori",
            Self::Ori => "ori",
            Self::Andi => "andi",
            Self::Slti => "slti",
            Self::Sltiu => "sltiu",
            Self::Slli => "slli",
            Self::Srli => "srli",
            Self::Srai => "srai",
            Self::Lb => "lb",
            Self::Lh => "lh",
            Self::Lw => "lw",
            Self::Lbu => "lbu",
            Self::Lhu => "lhu",
            Self::Jalr => "jalr",
            Self::Ebreak => "ebreak",
            Self::Sb => "sb",
            Self::Sh => "sh",
            Self::Sw => "sw",
            Self::Beq => "beq",
            Self::Bne => "bne",
            Self::Blt => "blt",
            Self::Bge => "bge",
            Self::Bltu => "bltu",
            Self::Bgeu => "bgeu",
            Self::Lui => "lui",
            Self::Auipc => "auipc",
            Self::Jal => "jal",
        }
    }

    /// Encoding format of the mnemonic.
    #[must_use]
    pub const fn format(self) -> Format {
        match self {
            Self::Add
            | Self::Sub
            | Self::And
            | Self::Or
            | Self::Xor
            | Self::Sll
            | Self::Srl
            | Self::Sra
            | Self::Slt
            | Self::Sltu
            | Self::Mul
            | Self::Mulh
            | Self::Mulhsu
            | Self::Mulhu
            | Self::Div
            | Self::Divu
            | Self::Rem
            | Self::Remu => Format::R,
            Self::Addi
            | Self::Xori
            | Self::Ori
            | Self::Andi
            | Self::Slti
            | Self::Sltiu
            | Self::Slli
            | Self::Srli
            | Self::Srai
            | Self::Lb
            | Self::Lh
            | Self::Lw
            | Self::Lbu
            | Self::Lhu
            | Self::Jalr
            | Self::Ebreak => Format::I,
            Self::Sb | Self::Sh | Self::Sw => Format::S,
            Self::Beq | Self::Bne | Self::Blt | Self::Bge | Self::Bltu | Self::Bgeu => Format::B,
            Self::Lui | Self::Auipc => Format::U,
            Self::Jal => Format::J,
        }
    }
}

/// One row of [`ENCODING_TABLE`]: `(opcode, funct3, funct7, mnemonic)`.
///
/// `None` in a `funct` column means the field is not part of the match.
pub type EncodingEntry = (u8, Option<u8>, Option<u8>, Mnemonic);

/// Single source-of-truth `(opcode, funct3, funct7)` table.
///
/// Any combination not present here is an unknown encoding.
pub const ENCODING_TABLE: &[EncodingEntry] = &[
    (OPCODE_OP, Some(0x0), Some(FUNCT7_BASE), Mnemonic::Add),
    (OPCODE_OP, Some(0x0), Some(FUNCT7_ALT), Mnemonic::Sub),
    (OPCODE_OP, Some(0x1), Some(FUNCT7_BASE), Mnemonic::Sll),
    (OPCODE_OP, Some(0x2), Some(FUNCT7_BASE), Mnemonic::Slt),
    (OPCODE_OP, Some(0x3), Some(FUNCT7_BASE), Mnemonic::Sltu),
    (OPCODE_OP, Some(0x4), Some(FUNCT7_BASE), Mnemonic::Xor),
    (OPCODE_OP, Some(0x5), Some(FUNCT7_BASE), Mnemonic::Srl),
    (OPCODE_OP, Some(0x5), Some(FUNCT7_ALT), Mnemonic::Sra),
    (OPCODE_OP, Some(0x6), Some(FUNCT7_BASE), Mnemonic::Or),
    (OPCODE_OP, Some(0x7), Some(FUNCT7_BASE), Mnemonic::And),
    (OPCODE_OP, Some(0x0), Some(FUNCT7_MULDIV), Mnemonic::Mul),
    (OPCODE_OP, Some(0x1), Some(FUNCT7_MULDIV), Mnemonic::Mulh),
    (OPCODE_OP, Some(0x2), Some(FUNCT7_MULDIV), Mnemonic::Mulhsu),
    (OPCODE_OP, Some(0x3), Some(FUNCT7_MULDIV), Mnemonic::Mulhu),
    (OPCODE_OP, Some(0x4), Some(FUNCT7_MULDIV), Mnemonic::Div),
    (OPCODE_OP, Some(0x5), Some(FUNCT7_MULDIV), Mnemonic::Divu),
    (OPCODE_OP, Some(0x6), Some(FUNCT7_MULDIV), Mnemonic::Rem),
    (OPCODE_OP, Some(0x7), Some(FUNCT7_MULDIV), Mnemonic::Remu),
    (OPCODE_OP_IMM, Some(0x0), None, Mnemonic::Addi),
    (OPCODE_OP_IMM, Some(0x1), Some(FUNCT7_BASE), Mnemonic::Slli),
    (OPCODE_OP_IMM, Some(0x2), None, Mnemonic::Slti),
    (OPCODE_OP_IMM, Some(0x3), None, Mnemonic::Sltiu),
    (OPCODE_OP_IMM, Some(0x4), None, Mnemonic::Xori),
    (OPCODE_OP_IMM, Some(0x5), Some(FUNCT7_BASE), Mnemonic::Srli),
    (OPCODE_OP_IMM, Some(0x5), Some(FUNCT7_ALT), Mnemonic::Srai),
    (OPCODE_OP_IMM, Some(0x6), None, Mnemonic::Ori),
    (OPCODE_OP_IMM, Some(0x7), None, Mnemonic::Andi),
    (OPCODE_LOAD, Some(0x0), None, Mnemonic::Lb),
    (OPCODE_LOAD, Some(0x1), None, Mnemonic::Lh),
    (OPCODE_LOAD, Some(0x2), None, Mnemonic::Lw),
    (OPCODE_LOAD, Some(0x4), None, Mnemonic::Lbu),
    (OPCODE_LOAD, Some(0x5), None, Mnemonic::Lhu),
    (OPCODE_STORE, Some(0x0), None, Mnemonic::Sb),
    (OPCODE_STORE, Some(0x1), None, Mnemonic::Sh),
    (OPCODE_STORE, Some(0x2), None, Mnemonic::Sw),
    (OPCODE_BRANCH, Some(0x0), None, Mnemonic::Beq),
    (OPCODE_BRANCH, Some(0x1), None, Mnemonic::Bne),
    (OPCODE_BRANCH, Some(0x4), None, Mnemonic::Blt),
    (OPCODE_BRANCH, Some(0x5), None, Mnemonic::Bge),
    (OPCODE_BRANCH, Some(0x6), None, Mnemonic::Bltu),
    (OPCODE_BRANCH, Some(0x7), None, Mnemonic::Bgeu),
    (OPCODE_JALR, Some(0x0), None, Mnemonic::Jalr),
    (OPCODE_JAL, None, None, Mnemonic::Jal),
    (OPCODE_LUI, None, None, Mnemonic::Lui),
    (OPCODE_AUIPC, None, None, Mnemonic::Auipc),
    (OPCODE_SYSTEM, Some(0x0), Some(FUNCT7_BASE), Mnemonic::Ebreak),
];

const fn field_matches(expected: Option<u8>, actual: u8) -> bool {
    match expected {
        Some(value) => value == actual,
        None => true,
    }
}

/// Returns the mnemonic selected by the `(opcode, funct3, funct7)` fields of `word`.
///
/// `None` means unknown encoding. The `ebreak` row only selects the mnemonic;
/// the decoder additionally requires the exact [`EBREAK_WORD`].
#[must_use]
pub fn classify(word: u32) -> Option<Mnemonic> {
    let (op, f3, f7) = (opcode(word), funct3(word), funct7(word));
    ENCODING_TABLE
        .iter()
        .find_map(|(entry_op, entry_f3, entry_f7, mnemonic)| {
            (*entry_op == op && field_matches(*entry_f3, f3) && field_matches(*entry_f7, f7))
                .then_some(*mnemonic)
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::{
        classify, funct3, funct7, imm_b, imm_i, imm_j, imm_s, imm_u, opcode, rd_field, rs1_field,
        rs2_field, Format, Mnemonic, ENCODING_TABLE, OPCODE_OP, OPCODE_OP_IMM,
    };

    #[test]
    fn table_rows_are_unique_and_cover_every_mnemonic() {
        let keys: HashSet<_> = ENCODING_TABLE
            .iter()
            .map(|(op, f3, f7, _)| (*op, *f3, *f7))
            .collect();
        assert_eq!(keys.len(), ENCODING_TABLE.len());

        let mnemonics: HashSet<_> = ENCODING_TABLE.iter().map(|row| row.3).collect();
        assert_eq!(mnemonics.len(), 46);
    }

    #[test]
    fn field_extraction_matches_bit_positions() {
        // add t2, t0, t1 with funct7 forced to 0x7f for visibility.
        let word = 0xFE62_83B3;
        assert_eq!(opcode(word), 0x33);
        assert_eq!(rd_field(word), 7);
        assert_eq!(funct3(word), 0);
        assert_eq!(rs1_field(word), 5);
        assert_eq!(rs2_field(word), 6);
        assert_eq!(funct7(word), 0x7F);
    }

    #[test]
    fn immediates_are_reconstructed_and_sign_extended() {
        // addi ra, zero, -1
        assert_eq!(imm_i(0xFFF0_0093), 0xFFFF_FFFF);
        // addi ra, zero, 0x7ff
        assert_eq!(imm_i(0x7FF0_0093), 0x7FF);
        // sw a0, -4(sp)
        assert_eq!(imm_s(0xFEA1_2E23), 0xFFFF_FFFC);
        // sw a0, 8(sp)
        assert_eq!(imm_s(0x00A1_2423), 8);
        // beq zero, zero, -8
        assert_eq!(imm_b(0xFE00_0CE3), 0xFFFF_FFF8);
        // bne t0, t1, 0x800
        assert_eq!(imm_b(0x0062_90E3), 0x800);
        // lui t0, 0x12345
        assert_eq!(imm_u(0x1234_52B7), 0x1234_5000);
        // jal ra, 0x800
        assert_eq!(imm_j(0x0010_00EF), 0x800);
        // jal zero, -4
        assert_eq!(imm_j(0xFFDF_F06F), 0xFFFF_FFFC);
    }

    #[test]
    fn shift_immediates_require_their_funct7() {
        let slli = 0x0010_9093;
        assert_eq!(classify(slli), Some(Mnemonic::Slli));
        assert_eq!(classify(slli | 0x0200_0000), None);

        let srai = 0x4010_D093;
        assert_eq!(classify(srai), Some(Mnemonic::Srai));
        assert_eq!(classify(srai & !0x4000_0000), Some(Mnemonic::Srli));
    }

    #[test]
    fn register_operations_require_exact_funct7() {
        let base = u32::from(OPCODE_OP);
        assert_eq!(classify(base), Some(Mnemonic::Add));
        assert_eq!(classify(base | 0x4000_0000), Some(Mnemonic::Sub));
        assert_eq!(classify(base | 0x0200_0000), Some(Mnemonic::Mul));
        assert_eq!(classify(base | 0x0400_0000), None);
        assert_eq!(classify(base | 0x4000_1000), None);
    }

    #[test]
    fn unassigned_encodings_are_unknown() {
        assert_eq!(classify(0x0000_0000), None);
        assert_eq!(classify(0x0000_007F), None);
        // lwu/ld style funct3 values on the load opcode
        assert_eq!(classify(0x0000_6003), None);
        assert_eq!(classify(0x0000_3003), None);
        // branch funct3 2 and 3 are unassigned
        assert_eq!(classify(0x0000_2063), None);
        assert_eq!(classify(0x0000_3063), None);
        // fence and ecall-style system rows
        assert_eq!(classify(0x0000_000F), None);
        assert_eq!(classify(0x0000_1073), None);
    }

    #[test]
    fn immediate_rows_ignore_funct7() {
        let addi_negative = u32::from(OPCODE_OP_IMM) | 0xFFF0_0000;
        assert_eq!(classify(addi_negative), Some(Mnemonic::Addi));
    }

    #[test]
    fn format_and_name_cover_representative_mnemonics() {
        assert_eq!(Mnemonic::Mulhsu.format(), Format::R);
        assert_eq!(Mnemonic::Jalr.format(), Format::I);
        assert_eq!(Mnemonic::Sh.format(), Format::S);
        assert_eq!(Mnemonic::Bgeu.format(), Format::B);
        assert_eq!(Mnemonic::Auipc.format(), Format::U);
        assert_eq!(Mnemonic::Jal.format(), Format::J);
        assert_eq!(Mnemonic::Ebreak.name(), "ebreak");
        assert_eq!(Mnemonic::Sltiu.name(), "sltiu");
    }

    proptest! {
        #[test]
        fn i_immediate_with_bit_11_set_is_sign_extended(imm12 in 0x800_u32..0x1000, low in 0_u32..0x10_0000) {
            let word = (imm12 << 20) | low;
            prop_assert_eq!(imm_i(word), imm12 | 0xFFFF_F000);
        }

        #[test]
        fn branch_and_jump_offsets_are_even(word in any::<u32>()) {
            prop_assert_eq!(imm_b(word) & 1, 0);
            prop_assert_eq!(imm_j(word) & 1, 0);
        }
    }
}
