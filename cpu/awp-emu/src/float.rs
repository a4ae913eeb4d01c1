//! The 48-bit AWP floating-point format and its operations: NF (normalize),
//! AF (add), SF (subtract), MF (multiply), DF (divide), plus conversion
//! to and from the host's f64.
//!
//! A float occupies the R1-R3 triplet: a 40-bit two's-complement mantissa
//! (R1, R2 and the high byte of R3) followed by an 8-bit two's-complement
//! exponent in the low byte of R3. The working form keeps the mantissa
//! left-justified in an i64; the 24 bits below the representable 40 are
//! headroom for exponent alignment and rounding.

use crate::flags;
use crate::{AddSub, Awp, AwpError, FpStatus};

/// The 40 representable mantissa bits.
const M_MASK: i64 = 0xFFFF_FFFF_FF00_0000_u64 as i64;
/// First bit below the representable precision; the rounding guard.
const M_GUARD: i64 = 1 << 23;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AwpFloat {
    m: i64,
    e: i32,
}

impl AwpFloat {
    fn unpack(words: [u16; 3]) -> Self {
        let m = (i64::from(words[0]) << 48)
            | (i64::from(words[1]) << 32)
            | (i64::from(words[2] & 0xFF00) << 16);
        // a zero mantissa means exponent 0 by definition
        let e = if m == 0 { 0 } else { i32::from((words[2] as u8) as i8) };

        Self { m, e }
    }

    fn pack(self) -> [u16; 3] {
        [
            (self.m >> 48) as u16,
            (self.m >> 32) as u16,
            ((self.m >> 16) as u16 & 0xFF00) | (self.e as u16 & 0x00FF),
        ]
    }

    /// Zero, or the sign bit differs from the mantissa bit below it
    /// (fractional magnitude in [0.5, 1)).
    fn is_normalized(self) -> bool {
        self.m == 0 || (self.m ^ (self.m << 1)) < 0
    }

    fn normalize(&mut self) {
        while self.m != 0 && (self.m ^ (self.m << 1)) >= 0 {
            self.m <<= 1;
            self.e -= 1;
        }
    }

    /// Shift the mantissa towards the guard bits, preserving the sign and
    /// the represented value.
    fn denormalize(&mut self, shift: u32) {
        self.m >>= shift;
        self.e += shift as i32;
    }

    /// Round to nearest, ties away from zero, on the guard bit.
    fn round(&mut self) {
        if self.m & M_GUARD != 0 {
            self.denormalize(1);
            self.m += M_GUARD;
            self.normalize();
        }
    }
}

/// Set Z and M from the mantissa, canonicalize zero, pack, and classify
/// the exponent. The packed words are returned so the caller decides where
/// they land; underflow and overflow are reported only after the fact.
fn store(mut f: AwpFloat, flags: &mut u16) -> ([u16; 3], FpStatus) {
    if f.m & M_MASK == 0 {
        f.e = 0;
        flags::set(flags, flags::FL_Z, true);
        flags::set(flags, flags::FL_M, false);
    } else {
        flags::set(flags, flags::FL_Z, false);
        flags::set(flags, flags::FL_M, f.m < 0);
    }

    let status = if f.e > 127 {
        FpStatus::Overflow
    } else if f.e < -128 {
        FpStatus::Underflow
    } else {
        FpStatus::Ok
    };

    (f.pack(), status)
}

impl Awp<'_> {
    fn float_reg(&self) -> AwpFloat {
        AwpFloat::unpack([*self.r1, *self.r2, *self.r3])
    }

    fn store_float(&mut self, f: AwpFloat) -> FpStatus {
        let (words, status) = store(f, self.flags);
        *self.r1 = words[0];
        *self.r2 = words[1];
        *self.r3 = words[2];
        status
    }

    /// NF: normalize the float in R1-R3 in place.
    ///
    /// The one float operation that accepts a denormalized input.
    pub fn float_norm(&mut self) -> FpStatus {
        let mut f = self.float_reg();
        f.normalize();

        // NF always clears C
        flags::set(self.flags, flags::FL_C, false);

        self.store_float(f)
    }

    /// AF/SF: add `n` to or subtract it from the float in R1-R3.
    pub fn float_addsub(&mut self, n: [u16; 3], op: AddSub) -> Result<FpStatus, AwpError> {
        let mut a = self.float_reg();
        let mut b = AwpFloat::unpack(n);
        if !a.is_normalized() || !b.is_normalized() {
            return Err(AwpError::DenormalizedOperand);
        }

        log::trace!("{op:?} {a:?} {b:?}");

        // denormalize the smaller operand to match exponents; a gap of 40
        // or more bits shifts the mantissa out entirely
        let ediff = a.e - b.e;
        if ediff < 0 {
            if ediff <= -40 {
                a.m = 0;
                a.e = b.e;
            } else {
                a.denormalize(ediff.unsigned_abs());
            }
        } else if ediff > 0 {
            if ediff >= 40 {
                b.m = 0;
                b.e = a.e;
            } else {
                b.denormalize(ediff.unsigned_abs());
            }
        }

        // one position of headroom so the sum cannot overflow the sign
        // (the hardware has register and ALU positions -1 for this)
        a.denormalize(1);
        b.denormalize(1);

        a.m += op.sign() * b.m;
        a.normalize();
        a.round();

        // C holds the leftover guard bit; V is never touched
        flags::set(self.flags, flags::FL_C, a.m & M_GUARD != 0);

        Ok(self.store_float(a))
    }

    /// MF: multiply the float in R1-R3 by `n`.
    pub fn float_mul(&mut self, n: [u16; 3]) -> Result<FpStatus, AwpError> {
        let mut a = self.float_reg();
        let mut b = AwpFloat::unpack(n);
        if !a.is_normalized() || !b.is_normalized() {
            return Err(AwpError::DenormalizedOperand);
        }

        log::trace!("MF {a:?} {b:?}");

        a.denormalize(1);
        b.denormalize(1);

        let negative = (a.m < 0) != (b.m < 0);
        a.m = a.m.abs();
        b.m = b.m.abs();

        let e = a.e + b.e;

        // shift-and-add multiply driven by the second mantissa; one extra
        // iteration makes up for the initial denormalization
        b.m >>= 23;
        let mut m = 0_i64;
        for _ in 0..41 {
            m >>= 1;
            if b.m & 1 != 0 {
                m += a.m;
            }
            b.m >>= 1;
        }

        a.m = if negative { -m } else { m };
        a.e = e;

        a.normalize();
        a.round();

        // C holds the leftover guard bit, as for AF/SF
        flags::set(self.flags, flags::FL_C, a.m & M_GUARD != 0);

        Ok(self.store_float(a))
    }

    /// DF: divide the float in R1-R3 by `n`.
    pub fn float_div(&mut self, n: [u16; 3]) -> Result<FpStatus, AwpError> {
        let mut a = self.float_reg();
        let mut b = AwpFloat::unpack(n);
        if !a.is_normalized() || !b.is_normalized() {
            return Err(AwpError::DenormalizedOperand);
        }
        if b.m == 0 {
            return Err(AwpError::DivideByZero);
        }

        log::trace!("DF {a:?} {b:?}");

        // two positions of headroom in the dividend keep the first partial
        // remainder below the divisor
        a.denormalize(2);
        b.denormalize(1);

        let negative = (a.m < 0) != (b.m < 0);
        a.m = a.m.abs();
        b.m = b.m.abs();

        a.e -= b.e;

        // restoring division, one quotient bit per step
        let mut rem = a.m;
        let mut q = 0_i64;
        for _ in 0..41 {
            rem -= b.m;
            q <<= 1;
            if rem < 0 {
                rem += b.m;
            } else {
                q |= M_GUARD;
            }
            rem <<= 1;
        }
        // -1.0 / 0.5 lands exactly on the mantissa minimum
        a.m = if negative { q.wrapping_neg() } else { q };

        a.normalize();

        // DF always clears C
        flags::set(self.flags, flags::FL_C, false);

        Ok(self.store_float(a))
    }
}

/// Convert an AWP float triplet to the host's f64.
///
/// Exact: the 40-bit mantissa is well within f64 precision and every
/// representable exponent stays in f64's normal range.
pub fn to_double(words: [u16; 3]) -> Result<f64, AwpError> {
    let f = AwpFloat::unpack(words);
    if !f.is_normalized() {
        return Err(AwpError::DenormalizedOperand);
    }

    Ok((f.m as f64) * 2_f64.powi(f.e - 63))
}

/// Convert the host's f64 to an AWP float triplet, setting Z and M in
/// `flags`.
///
/// With `round` set, the guard bit rounds the 40-bit mantissa to nearest
/// (ties away from zero) exactly as AF/SF do, and C receives the leftover
/// guard; without it the extra precision is truncated and C is untouched.
pub fn from_double(
    out: &mut [u16; 3],
    flags: &mut u16,
    value: f64,
    round: bool,
) -> Result<FpStatus, AwpError> {
    if !value.is_finite() {
        return Err(AwpError::NotFinite);
    }

    let mut f = decompose(value);
    // the host mantissa is [0.5, 1); the AWP range also covers [-1, -0.5),
    // so a negative power of two must be shifted up to its canonical form
    f.normalize();

    if round {
        f.round();
        flags::set(flags, flags::FL_C, f.m & M_GUARD != 0);
    }

    let (words, status) = store(f, flags);
    *out = words;

    Ok(status)
}

/// Split a finite f64 into a left-justified 64-bit mantissa and a binary
/// exponent. The standard library exposes no `frexp`, so the fields come
/// straight out of the bit representation.
fn decompose(value: f64) -> AwpFloat {
    let bits = value.to_bits();
    let negative = bits >> 63 != 0;
    let biased = ((bits >> 52) & 0x7FF) as i32;
    let fraction = bits & ((1_u64 << 52) - 1);

    let (magnitude, e) = if biased != 0 {
        // normal: the implicit leading 1 lands just below the sign bit
        ((1_u64 << 62) | (fraction << 10), biased - 1022)
    } else if fraction != 0 {
        // subnormal: shift the fraction up to the same position
        let lz = fraction.leading_zeros();
        (fraction << (lz - 1), -1010 - lz as i32)
    } else {
        (0, 0)
    };

    let m = if negative { -(magnitude as i64) } else { magnitude as i64 };
    AwpFloat { m, e }
}
