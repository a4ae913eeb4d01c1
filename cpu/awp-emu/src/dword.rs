//! 32-bit integer operations on the (R1, R2) register pair: AD (add),
//! SD (subtract), MW (multiply), DW (divide).

use crate::flags;
use crate::{AddSub, Awp, AwpError};
use emawp_common::num::{U32Ext, word_pair};

impl Awp<'_> {
    /// AD/SD: 32-bit add or subtract of `n` to/from (R1, R2).
    ///
    /// Subtraction is performed as addition with the operand negated in
    /// 64 bits, and reuses the addition flag rules wholesale.
    pub fn dword_addsub(&mut self, n: [u16; 2], op: AddSub) {
        let a = word_pair(*self.r1, *self.r2);
        let b = word_pair(n[0], n[1]);
        let res = (i64::from(a) + op.sign() * i64::from(b)) as u64;

        log::trace!("{op:?} {a:08X} {b:08X} = {res:016X}");

        *self.r1 = (res as u32).high_word();
        *self.r2 = (res as u32).low_word();

        // V feeds M, so the order matters
        let v = flags::update_overflow_dword(self.flags, a, b, res);
        flags::set_minus_dword(self.flags, res, v);
        flags::set_carry_dword(self.flags, res);
        flags::set_zero_dword(self.flags, res);
    }

    /// MW: signed 16x16 multiply of R2 by `n`, 32-bit result in (R1, R2).
    pub fn dword_mul(&mut self, n: i16) {
        let res = i64::from(*self.r2 as i16) * i64::from(n);

        *self.r1 = (res as u32).high_word();
        *self.r2 = (res as u32).low_word();

        // MW touches neither V nor C
        flags::set_minus_dword(self.flags, res as u64, false);
        flags::set_zero_dword(self.flags, res as u64);
    }

    /// DW: signed 32-bit divide of (R1, R2) by `n`; quotient to R2,
    /// remainder to R1.
    ///
    /// On either error the registers and flags stay unchanged.
    pub fn dword_div(&mut self, n: i16) -> Result<(), AwpError> {
        if n == 0 {
            return Err(AwpError::DivideByZero);
        }

        let a = word_pair(*self.r1, *self.r2) as i32;

        let mut quotient = i64::from(a) / i64::from(n);
        // the hardware produces 1 for this particular input pair
        if a == i32::MAX && n == i16::MIN {
            quotient = 1;
        }

        if quotient > i64::from(i16::MAX) || quotient < i64::from(i16::MIN) {
            return Err(AwpError::QuotientOverflow);
        }

        let remainder = a % i32::from(n);
        log::trace!("DW {a} / {n} = {quotient} rem {remainder}");

        *self.r2 = quotient as u16;
        *self.r1 = remainder as u16;

        // DW touches neither V nor C
        flags::set_minus_dword(self.flags, quotient as u64, false);
        flags::set_zero_dword(self.flags, quotient as u64);

        Ok(())
    }
}

#[cfg(test)]
mod tests;
