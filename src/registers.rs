//! The 32 general-purpose registers.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A general-purpose register. Numbering and names match the target ABI
/// exactly; `Register as u8` is the 5-bit field written into encoded
/// instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Register {
    Zero = 0,
    Ra = 1,
    Sp = 2,
    Gp = 3,
    K0 = 4,
    K1 = 5,
    Pg = 6,
    Ar = 7,
    S0 = 8,
    S1 = 9,
    S2 = 10,
    S3 = 11,
    S4 = 12,
    S5 = 13,
    S6 = 14,
    S7 = 15,
    T0 = 16,
    T1 = 17,
    T2 = 18,
    T3 = 19,
    T4 = 20,
    T5 = 21,
    T6 = 22,
    T7 = 23,
    Fn0 = 24,
    Fn1 = 25,
    Fn2 = 26,
    Fn3 = 27,
    Fn4 = 28,
    Fn5 = 29,
    Fn6 = 30,
    Fn7 = 31,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("register field {0} out of range (0..=31)")]
pub struct RegisterRangeError(pub u8);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown register name {0:?}")]
pub struct RegisterNameError(pub String);

impl Register {
    pub const ALL: [Register; 32] = [
        Register::Zero,
        Register::Ra,
        Register::Sp,
        Register::Gp,
        Register::K0,
        Register::K1,
        Register::Pg,
        Register::Ar,
        Register::S0,
        Register::S1,
        Register::S2,
        Register::S3,
        Register::S4,
        Register::S5,
        Register::S6,
        Register::S7,
        Register::T0,
        Register::T1,
        Register::T2,
        Register::T3,
        Register::T4,
        Register::T5,
        Register::T6,
        Register::T7,
        Register::Fn0,
        Register::Fn1,
        Register::Fn2,
        Register::Fn3,
        Register::Fn4,
        Register::Fn5,
        Register::Fn6,
        Register::Fn7,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Register::Zero => "zero",
            Register::Ra => "ra",
            Register::Sp => "sp",
            Register::Gp => "gp",
            Register::K0 => "k0",
            Register::K1 => "k1",
            Register::Pg => "pg",
            Register::Ar => "ar",
            Register::S0 => "s0",
            Register::S1 => "s1",
            Register::S2 => "s2",
            Register::S3 => "s3",
            Register::S4 => "s4",
            Register::S5 => "s5",
            Register::S6 => "s6",
            Register::S7 => "s7",
            Register::T0 => "t0",
            Register::T1 => "t1",
            Register::T2 => "t2",
            Register::T3 => "t3",
            Register::T4 => "t4",
            Register::T5 => "t5",
            Register::T6 => "t6",
            Register::T7 => "t7",
            Register::Fn0 => "fn0",
            Register::Fn1 => "fn1",
            Register::Fn2 => "fn2",
            Register::Fn3 => "fn3",
            Register::Fn4 => "fn4",
            Register::Fn5 => "fn5",
            Register::Fn6 => "fn6",
            Register::Fn7 => "fn7",
        }
    }
}

impl TryFrom<u8> for Register {
    type Error = RegisterRangeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Register::ALL
            .get(value as usize)
            .copied()
            .ok_or(RegisterRangeError(value))
    }
}

impl FromStr for Register {
    type Err = RegisterNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Register::ALL
            .iter()
            .copied()
            .find(|r| r.name() == s)
            .ok_or_else(|| RegisterNameError(s.to_string()))
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_through_u8() {
        for r in Register::ALL {
            assert_eq!(Register::try_from(r as u8), Ok(r));
        }
    }

    #[test]
    fn out_of_range_rejected() {
        assert_eq!(Register::try_from(32), Err(RegisterRangeError(32)));
    }

    #[test]
    fn name_roundtrip() {
        for r in Register::ALL {
            assert_eq!(r.name().parse::<Register>(), Ok(r));
        }
    }

    #[test]
    fn display_matches_name() {
        assert_eq!(Register::T3.to_string(), "t3");
    }
}
