use std::fmt;

use thiserror::Error;

/// Number of architecturally visible integer registers (`x0..x31`).
pub const GENERAL_REGISTER_COUNT: usize = 32;

/// ABI names indexed by register number.
pub const ABI_NAMES: [&str; GENERAL_REGISTER_COUNT] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Integer register identifier decoded from a 5-bit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8"))]
pub struct Register(u8);

/// Register number outside `x0..=x31`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("register number {0} is out of range")]
pub struct InvalidRegister(pub u8);

impl Register {
    /// Hard-wired zero register.
    pub const ZERO: Self = Self(0);
    /// Return address register (`x1`).
    pub const RA: Self = Self(1);
    /// Stack pointer (`x2`).
    pub const SP: Self = Self(2);

    /// Decodes the low five bits of `bits` into a register.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_u5(bits: u32) -> Self {
        Self((bits & 0x1F) as u8)
    }

    /// Returns a register by number, or `None` above `x31`.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < GENERAL_REGISTER_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Returns the array index for this register (`0..=31`).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the register number as encoded in instruction fields.
    #[must_use]
    pub const fn number(self) -> u32 {
        self.0 as u32
    }

    /// Returns the ABI name (`zero`, `ra`, `sp`, ...).
    #[must_use]
    pub const fn abi_name(self) -> &'static str {
        ABI_NAMES[self.0 as usize]
    }

    /// Returns `true` for the hard-wired zero register.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Iterates over `x0..=x31` in order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn all() -> impl Iterator<Item = Self> {
        (0..GENERAL_REGISTER_COUNT as u8).map(Self)
    }
}

impl TryFrom<u8> for Register {
    type Error = InvalidRegister;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index).ok_or(InvalidRegister(index))
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abi_name())
    }
}

/// Architectural register state: the integer register file and `PC`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    gpr: [u32; GENERAL_REGISTER_COUNT],
    pc: u32,
}

impl ArchitecturalState {
    /// Creates a zeroed register file with `PC` at `pc`.
    #[must_use]
    pub const fn with_pc(pc: u32) -> Self {
        Self {
            gpr: [0; GENERAL_REGISTER_COUNT],
            pc,
        }
    }

    /// Reads a register as a raw 32-bit word.
    #[must_use]
    pub const fn gpr(&self, reg: Register) -> u32 {
        self.gpr[reg.index()]
    }

    /// Reads a register as a two's-complement signed word.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn gpr_signed(&self, reg: Register) -> i32 {
        self.gpr[reg.index()] as i32
    }

    /// Writes a register. Writes to `x0` are discarded.
    pub const fn set_gpr(&mut self, reg: Register, value: u32) {
        if !reg.is_zero() {
            self.gpr[reg.index()] = value;
        }
    }

    /// Returns the whole register file, `x0` first.
    #[must_use]
    pub const fn registers(&self) -> &[u32; GENERAL_REGISTER_COUNT] {
        &self.gpr
    }

    /// Reads the `PC` register.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Writes the `PC` register.
    pub const fn set_pc(&mut self, value: u32) {
        self.pc = value;
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ArchitecturalState, InvalidRegister, Register, ABI_NAMES, GENERAL_REGISTER_COUNT,
    };

    #[test]
    fn register_count_and_decode_match_architecture() {
        assert_eq!(GENERAL_REGISTER_COUNT, 32);

        for bits in 0_u32..32 {
            assert_eq!(Register::from_u5(bits).number(), bits);
        }
        assert_eq!(Register::from_u5(0x21), Register::RA);
        assert!(Register::new(32).is_none());
        assert_eq!(Register::all().count(), 32);
    }

    #[test]
    fn try_from_rejects_numbers_above_x31() {
        assert_eq!(Register::try_from(31), Ok(Register::from_u5(31)));
        assert_eq!(Register::try_from(32), Err(InvalidRegister(32)));
        assert_eq!(
            Register::try_from(200).unwrap_err().to_string(),
            "register number 200 is out of range"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_rejects_numbers_above_x31() {
        use serde::de::{value::Error, IntoDeserializer};
        use serde::Deserialize;

        let valid: Result<Register, Error> = Register::deserialize(10_u8.into_deserializer());
        assert_eq!(valid, Ok(Register::from_u5(10)));

        let invalid: Result<Register, Error> = Register::deserialize(200_u8.into_deserializer());
        assert!(invalid.is_err());
    }

    #[test]
    fn abi_names_follow_calling_convention() {
        assert_eq!(Register::ZERO.abi_name(), "zero");
        assert_eq!(Register::RA.to_string(), "ra");
        assert_eq!(Register::SP.abi_name(), "sp");
        assert_eq!(Register::from_u5(10).abi_name(), "a0");
        assert_eq!(Register::from_u5(31).abi_name(), "t6");
        assert_eq!(ABI_NAMES.len(), GENERAL_REGISTER_COUNT);
    }

    #[test]
    fn general_register_file_tracks_each_register_independently() {
        let mut state = ArchitecturalState::default();

        for (offset, reg) in (0_u32..).zip(Register::all()) {
            state.set_gpr(reg, 0x1000 + offset);
        }

        assert_eq!(state.gpr(Register::ZERO), 0);
        for (offset, reg) in (0_u32..).zip(Register::all()).skip(1) {
            assert_eq!(state.gpr(reg), 0x1000 + offset);
        }
    }

    #[test]
    fn zero_register_discards_writes() {
        let mut state = ArchitecturalState::default();
        state.set_gpr(Register::ZERO, 0xDEAD_BEEF);

        assert_eq!(state.gpr(Register::ZERO), 0);
        assert_eq!(state.registers()[0], 0);
    }

    #[test]
    fn signed_view_reinterprets_bits() {
        let mut state = ArchitecturalState::with_pc(0x8000_0000);
        state.set_gpr(Register::from_u5(5), 0xFFFF_FFFE);

        assert_eq!(state.gpr_signed(Register::from_u5(5)), -2);
        assert_eq!(state.pc(), 0x8000_0000);
    }
}
