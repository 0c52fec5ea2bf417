//! Helper functions for instruction execution.

use crate::memory::INSTRUCTION_BYTES;

/// Address of the instruction following `pc`.
#[must_use]
pub const fn sequential_pc(pc: u32) -> u32 {
    pc.wrapping_add(INSTRUCTION_BYTES)
}

/// `base + offset` with 32-bit wraparound, used by loads, stores and `jalr`.
#[must_use]
pub const fn effective_address(base: u32, offset: u32) -> u32 {
    base.wrapping_add(offset)
}

/// `jalr` target: `base + offset` with bit 0 cleared.
#[must_use]
pub const fn jalr_target(base: u32, offset: u32) -> u32 {
    effective_address(base, offset) & !1
}

/// Sign-extends the low `bits` bits of `value`.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub const fn sign_extend(value: u32, bits: u32) -> u32 {
    let shift = 32 - bits;
    (((value << shift) as i32) >> shift) as u32
}

#[cfg(test)]
mod tests {
    use super::{effective_address, jalr_target, sequential_pc, sign_extend};

    #[test]
    fn sequential_pc_wraps_at_top_of_address_space() {
        assert_eq!(sequential_pc(0x8000_0000), 0x8000_0004);
        assert_eq!(sequential_pc(0xFFFF_FFFC), 0);
    }

    #[test]
    fn effective_address_adds_negative_offsets() {
        assert_eq!(effective_address(0x8000_0010, 0xFFFF_FFFC), 0x8000_000C);
    }

    #[test]
    fn jalr_target_clears_bit_zero() {
        assert_eq!(jalr_target(0x8000_0001, 0), 0x8000_0000);
        assert_eq!(jalr_target(0x8000_0000, 3), 0x8000_0002);
    }

    #[test]
    fn sign_extend_replicates_top_bit() {
        assert_eq!(sign_extend(0x80, 8), 0xFFFF_FF80);
        assert_eq!(sign_extend(0x7F, 8), 0x7F);
        assert_eq!(sign_extend(0x8000, 16), 0xFFFF_8000);
        assert_eq!(sign_extend(0x1234_8000, 16), 0xFFFF_8000);
    }
}
