//! Instruction disassembly for RV32IM.
//!
//! Operands use ABI register names. Immediates are printed as masked hex
//! fields (`0x001`, `0xfff` for -1) so the text lines up with the encoding.

use std::fmt;

use crate::decoder::{BType, Decoder, IType, JType, Operation, RType, SType, UType};
use crate::memory::{Memory, INSTRUCTION_BYTES};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DisassemblyRow {
    /// Address of the instruction.
    pub addr: u32,
    /// Raw instruction word.
    pub raw_word: u32,
    /// The instruction mnemonic (e.g. `addi`), or `.word` for illegal encodings.
    pub mnemonic: String,
    /// The formatted operands (e.g. `ra,zero,0x001`).
    pub operands: String,
    /// Whether this word is an unknown encoding.
    pub is_illegal: bool,
}

impl fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operands.is_empty() {
            f.write_str(&self.mnemonic)
        } else {
            write!(f, "{:<7}{}", self.mnemonic, self.operands)
        }
    }
}

/// Disassembles one instruction word fetched from `addr`.
#[must_use]
pub fn disassemble(addr: u32, word: u32) -> DisassemblyRow {
    match Decoder::decode(word) {
        Ok(operation) => DisassemblyRow {
            addr,
            raw_word: word,
            mnemonic: operation.mnemonic().name().to_owned(),
            operands: format_operands(operation),
            is_illegal: false,
        },
        Err(_) => DisassemblyRow {
            addr,
            raw_word: word,
            mnemonic: ".word".to_owned(),
            operands: format!("0x{word:08x} ; ILLEGAL"),
            is_illegal: true,
        },
    }
}

/// Disassembles up to `count` consecutive words starting at `start`.
///
/// Stops early at the first address that cannot be fetched.
#[must_use]
pub fn disassemble_window(memory: &Memory, start: u32, count: usize) -> Vec<DisassemblyRow> {
    let mut rows = Vec::with_capacity(count);
    let mut addr = start;
    for _ in 0..count {
        let Some(word) = memory.peek_word(addr) else {
            break;
        };
        rows.push(disassemble(addr, word));
        addr = addr.wrapping_add(INSTRUCTION_BYTES);
    }
    rows
}

/// Formats the operand field of a decoded operation.
#[must_use]
pub fn format_operands(operation: Operation) -> String {
    match operation {
        Operation::Add(i)
        | Operation::Sub(i)
        | Operation::And(i)
        | Operation::Or(i)
        | Operation::Xor(i)
        | Operation::Sll(i)
        | Operation::Srl(i)
        | Operation::Sra(i)
        | Operation::Slt(i)
        | Operation::Sltu(i)
        | Operation::Mul(i)
        | Operation::Mulh(i)
        | Operation::Mulhsu(i)
        | Operation::Mulhu(i)
        | Operation::Div(i)
        | Operation::Divu(i)
        | Operation::Rem(i)
        | Operation::Remu(i) => register_operands(i),
        Operation::Addi(i)
        | Operation::Xori(i)
        | Operation::Ori(i)
        | Operation::Andi(i)
        | Operation::Slti(i)
        | Operation::Sltiu(i)
        | Operation::Jalr(i) => immediate_operands(i),
        Operation::Slli(i) | Operation::Srli(i) | Operation::Srai(i) => {
            format!("{},{},{}", i.rd, i.rs1, i.shamt())
        }
        Operation::Lb(i)
        | Operation::Lh(i)
        | Operation::Lw(i)
        | Operation::Lbu(i)
        | Operation::Lhu(i) => format!("{},0x{:03x}({})", i.rd, i.imm & 0xFFF, i.rs1),
        Operation::Sb(s) | Operation::Sh(s) | Operation::Sw(s) => store_operands(s),
        Operation::Beq(b)
        | Operation::Bne(b)
        | Operation::Blt(b)
        | Operation::Bge(b)
        | Operation::Bltu(b)
        | Operation::Bgeu(b) => branch_operands(b),
        Operation::Lui(u) | Operation::Auipc(u) => upper_operands(u),
        Operation::Jal(j) => jump_operands(j),
        Operation::Ebreak(_) => String::new(),
    }
}

fn register_operands(i: RType) -> String {
    format!("{},{},{}", i.rd, i.rs1, i.rs2)
}

fn immediate_operands(i: IType) -> String {
    format!("{},{},0x{:03x}", i.rd, i.rs1, i.imm & 0xFFF)
}

fn store_operands(s: SType) -> String {
    format!("{},0x{:03x}({})", s.rs2, s.imm & 0xFFF, s.rs1)
}

fn branch_operands(b: BType) -> String {
    format!("{},{},0x{:03x}", b.rs1, b.rs2, b.imm & 0x1FFF)
}

fn upper_operands(u: UType) -> String {
    format!("{},0x{:05x}", u.rd, u.imm >> 12)
}

fn jump_operands(j: JType) -> String {
    format!("{},0x{:05x}", j.rd, j.imm & 0x1F_FFFF)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{disassemble, disassemble_window};
    use crate::memory::Memory;

    const BASE: u32 = 0x8000_0000;

    #[rstest]
    #[case(0x0010_0093, "addi", "ra,zero,0x001")]
    #[case(0xFFF0_0093, "addi", "ra,zero,0xfff")]
    #[case(0x0062_83B3, "add", "t2,t0,t1")]
    #[case(0x02C5_C533, "div", "a0,a1,a2")]
    #[case(0x41F2_D293, "srai", "t0,t0,31")]
    #[case(0x0041_2503, "lw", "a0,0x004(sp)")]
    #[case(0xFEA1_2E23, "sw", "a0,0xffc(sp)")]
    #[case(0x0062_8463, "beq", "t0,t1,0x008")]
    #[case(0x1234_52B7, "lui", "t0,0x12345")]
    #[case(0x0010_00EF, "jal", "ra,0x00800")]
    #[case(0x0000_8067, "jalr", "zero,ra,0x000")]
    fn disassemble_known_words(#[case] word: u32, #[case] mnemonic: &str, #[case] operands: &str) {
        let row = disassemble(BASE, word);
        assert!(!row.is_illegal);
        assert_eq!(row.mnemonic, mnemonic);
        assert_eq!(row.operands, operands);
    }

    #[test]
    fn disassemble_ebreak_has_no_operands() {
        let row = disassemble(BASE, 0x0010_0073);
        assert_eq!(row.to_string(), "ebreak");
    }

    #[test]
    fn disassemble_illegal() {
        let row = disassemble(BASE, 0xFFFF_FFFF);
        assert!(row.is_illegal);
        assert_eq!(row.to_string(), ".word  0xffffffff ; ILLEGAL");
    }

    #[test]
    fn display_pads_mnemonic_column() {
        let row = disassemble(BASE, 0x0010_0093);
        assert_eq!(row.to_string(), "addi   ra,zero,0x001");
    }

    #[test]
    fn window_stops_at_memory_end() {
        let mut memory = Memory::default();
        let last = BASE + 0x7FF8;
        memory.write_u32(last, 0x0010_0093).unwrap();
        memory.write_u32(last + 4, 0x0010_0073).unwrap();

        let rows = disassemble_window(&memory, last, 5);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].addr, last);
        assert_eq!(rows[1].mnemonic, "ebreak");
    }
}
