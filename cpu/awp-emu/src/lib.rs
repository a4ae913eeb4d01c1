//! Emulation core for the MERA-400 arithmetic extension unit (AWP)
//!
//! The AWP operates on three consecutive 16-bit CPU registers (R1-R3) and
//! the condition flags in the top nibble of R0: 32-bit integer add,
//! subtract, multiply and divide on the (R1, R2) pair, and 48-bit
//! floating-point arithmetic on the full triplet. The kernel borrows all
//! four words from the caller for the duration of one operation; it
//! performs no I/O and keeps no state across calls.
//!
//! The floating-point format is not IEEE 754: a 40-bit two's-complement
//! mantissa in `[-1, -0.5) ∪ [0.5, 1)` followed by an 8-bit two's-complement
//! exponent. `-1.0` is representable; `+1.0` is not.

pub mod flags;

mod dword;
mod float;

pub use float::{from_double, to_double};

use thiserror::Error;

/// Outcome of an operation whose result was written back.
///
/// Exponent underflow and overflow are advisory: the truncated result and
/// the flags have already been stored by the time they are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum FpStatus {
    Ok,
    Underflow,
    Overflow,
}

/// Errors that leave the bound registers and flags untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AwpError {
    #[error("division quotient does not fit in 16 bits")]
    QuotientOverflow,
    #[error("operand is denormalized")]
    DenormalizedOperand,
    #[error("division by zero")]
    DivideByZero,
    #[error("value is not a finite number")]
    NotFinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddSub {
    Add,
    Sub,
}

impl AddSub {
    pub(crate) fn sign(self) -> i64 {
        match self {
            Self::Add => 1,
            Self::Sub => -1,
        }
    }
}

/// The arithmetic unit, bound to the caller's register words.
///
/// `flags` is the condition-flags word (R0 on the MERA-400); only its top
/// nibble is ever modified. `r1`-`r3` hold the 32-bit operand pair for the
/// integer operations and the float triplet for the floating-point ones.
#[derive(Debug)]
pub struct Awp<'a> {
    flags: &'a mut u16,
    r1: &'a mut u16,
    r2: &'a mut u16,
    r3: &'a mut u16,
}

impl<'a> Awp<'a> {
    pub fn new(
        flags: &'a mut u16,
        r1: &'a mut u16,
        r2: &'a mut u16,
        r3: &'a mut u16,
    ) -> Self {
        Self { flags, r1, r2, r3 }
    }
}
