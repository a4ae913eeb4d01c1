use crate::flags::{FL_C, FL_M, FL_V, FL_Z};
use crate::{AddSub, Awp, AwpError};
use emawp_common::num::{U32Ext, word_pair};

fn run_addsub(op: AddSub, a: u32, n: u32, flags_in: u16) -> (u32, u16) {
    let mut flags = flags_in;
    let mut r1 = a.high_word();
    let mut r2 = a.low_word();
    let mut r3 = 0;

    Awp::new(&mut flags, &mut r1, &mut r2, &mut r3)
        .dword_addsub([n.high_word(), n.low_word()], op);

    (word_pair(r1, r2), flags)
}

fn run_mul(a_low: u16, n: i16, flags_in: u16) -> (u32, u16) {
    let mut flags = flags_in;
    let mut r1 = 0;
    let mut r2 = a_low;
    let mut r3 = 0;

    Awp::new(&mut flags, &mut r1, &mut r2, &mut r3).dword_mul(n);

    (word_pair(r1, r2), flags)
}

fn run_div(a: u32, n: i16, flags_in: u16) -> (Result<(), AwpError>, u16, u16, u16) {
    let mut flags = flags_in;
    let mut r1 = a.high_word();
    let mut r2 = a.low_word();
    let mut r3 = 0;

    let result = Awp::new(&mut flags, &mut r1, &mut r2, &mut r3).dword_div(n);

    (result, r1, r2, flags)
}

#[test]
fn add_basic() {
    let (res, flags) = run_addsub(AddSub::Add, 1, 2, 0);
    assert_eq!(res, 3);
    assert_eq!(flags, 0);
}

#[test]
fn add_carry_and_zero() {
    // 0xFFFFFFFF + 1 wraps to 0 with a carry out of bit 0
    let (res, flags) = run_addsub(AddSub::Add, 0xFFFF_FFFF, 1, 0);
    assert_eq!(res, 0);
    assert_eq!(flags, FL_Z | FL_C);
}

#[test]
fn add_positive_overflow() {
    // 0x7FFFFFFF + 1: V set; M reflects the true (positive) sign
    let (res, flags) = run_addsub(AddSub::Add, 0x7FFF_FFFF, 1, 0);
    assert_eq!(res, 0x8000_0000);
    assert_eq!(flags, FL_V);
}

#[test]
fn add_negative_overflow() {
    // 0x80000000 + 0x80000000: result bits are zero, true sign is negative
    let (res, flags) = run_addsub(AddSub::Add, 0x8000_0000, 0x8000_0000, 0);
    assert_eq!(res, 0);
    assert_eq!(flags, FL_Z | FL_M | FL_V | FL_C);
}

#[test]
fn add_negative_result() {
    // 2 + (-5)
    let (res, flags) = run_addsub(AddSub::Add, 2, 0xFFFF_FFFB, 0);
    assert_eq!(res, 0xFFFF_FFFD);
    assert_eq!(flags, FL_M);
}

#[test]
fn sub_basic() {
    let (res, flags) = run_addsub(AddSub::Sub, 5, 3, 0);
    assert_eq!(res, 2);
    assert_eq!(flags, 0);
}

#[test]
fn sub_borrow() {
    // 3 - 5: the 64-bit difference is negative, so the carry position is set
    let (res, flags) = run_addsub(AddSub::Sub, 3, 5, 0);
    assert_eq!(res, 0xFFFF_FFFE);
    assert_eq!(flags, FL_V | FL_C);
}

#[test]
fn sub_to_zero() {
    let (res, flags) = run_addsub(AddSub::Sub, 5, 5, 0);
    assert_eq!(res, 0);
    assert_eq!(flags, FL_Z);
}

#[test]
fn overflow_flag_is_sticky() {
    // a previously set V survives an operation that does not overflow
    let (res, flags) = run_addsub(AddSub::Add, 1, 2, FL_V);
    assert_eq!(res, 3);
    assert_eq!(flags, FL_V);
}

#[test]
fn addsub_preserves_non_flag_bits() {
    let (_, flags) = run_addsub(AddSub::Add, 1, 2, 0x0ABC);
    assert_eq!(flags, 0x0ABC);
}

#[test]
fn addsub_matches_reference_model() {
    let values = [
        0,
        1,
        2,
        0x7FFF,
        0x8000,
        0xFFFF,
        0x0001_0000,
        0x7FFF_FFFF,
        0x8000_0000,
        0x8000_0001,
        0xFFFF_FFFE,
        0xFFFF_FFFF,
    ];

    for op in [AddSub::Add, AddSub::Sub] {
        for &a in &values {
            for &n in &values {
                let (res, flags) = run_addsub(op, a, n, 0);

                // wide signed evaluation of the same operation
                let wide = match op {
                    AddSub::Add => i128::from(a) + i128::from(n),
                    AddSub::Sub => i128::from(a) - i128::from(n),
                };
                let expected = wide as u32;

                let sign_a = a >> 31 != 0;
                let sign_n = n >> 31 != 0;
                let sign_res = expected >> 31 != 0;
                let v = sign_a == sign_n && sign_res != sign_a;
                let m = sign_res != v;
                let c = (wide >> 32) & 1 != 0;
                let z = expected == 0;

                let mut expected_flags = 0;
                if z {
                    expected_flags |= FL_Z;
                }
                if m {
                    expected_flags |= FL_M;
                }
                if v {
                    expected_flags |= FL_V;
                }
                if c {
                    expected_flags |= FL_C;
                }

                assert_eq!(res, expected, "{op:?} {a:08X} {n:08X}");
                assert_eq!(flags, expected_flags, "{op:?} {a:08X} {n:08X}");
            }
        }
    }
}

#[test]
fn mul_basic() {
    let (res, flags) = run_mul(0x4000, 2, 0);
    assert_eq!(res, 0x0000_8000);
    assert_eq!(flags, 0);
}

#[test]
fn mul_negative() {
    // -2 * 3 = -6
    let (res, flags) = run_mul(0xFFFE, 3, 0);
    assert_eq!(res, 0xFFFF_FFFA);
    assert_eq!(flags, FL_M);
}

#[test]
fn mul_min_by_min() {
    // -32768 * -32768 = 0x40000000
    let (res, flags) = run_mul(0x8000, i16::MIN, 0);
    assert_eq!(res, 0x4000_0000);
    assert_eq!(flags, 0);
}

#[test]
fn mul_zero() {
    let (res, flags) = run_mul(0x1234, 0, 0);
    assert_eq!(res, 0);
    assert_eq!(flags, FL_Z);
}

#[test]
fn mul_leaves_v_and_c_alone() {
    let (_, flags) = run_mul(2, 3, FL_V | FL_C);
    assert_eq!(flags, FL_V | FL_C);
}

#[test]
fn div_basic() {
    let (result, r1, r2, flags) = run_div(100, 7, 0);
    assert_eq!(result, Ok(()));
    assert_eq!(r2, 14);
    assert_eq!(r1, 2);
    assert_eq!(flags, 0);
}

#[test]
fn div_negative_dividend() {
    // -100 / 7 truncates toward zero: quotient -14, remainder -2
    let (result, r1, r2, flags) = run_div(0xFFFF_FF9C, 7, 0);
    assert_eq!(result, Ok(()));
    assert_eq!(r2, 0xFFF2);
    assert_eq!(r1, 0xFFFE);
    assert_eq!(flags, FL_M);
}

#[test]
fn div_by_zero_leaves_state_unchanged() {
    let (result, r1, r2, flags) = run_div(0x1234_5678, 0, 0x2ABC);
    assert_eq!(result, Err(AwpError::DivideByZero));
    assert_eq!((r1, r2), (0x1234, 0x5678));
    assert_eq!(flags, 0x2ABC);
}

#[test]
fn div_quotient_overflow_leaves_state_unchanged() {
    // 0x00010000 / 1 = 65536, one too many for a signed 16-bit quotient
    let (result, r1, r2, flags) = run_div(0x0001_0000, 1, 0x2ABC);
    assert_eq!(result, Err(AwpError::QuotientOverflow));
    assert_eq!((r1, r2), (0x0001, 0x0000));
    assert_eq!(flags, 0x2ABC);
}

#[test]
fn div_min_by_minus_one_overflows() {
    let (result, r1, r2, _) = run_div(0x8000_0000, -1, 0);
    assert_eq!(result, Err(AwpError::QuotientOverflow));
    assert_eq!((r1, r2), (0x8000, 0x0000));
}

#[test]
fn div_hardware_quirk() {
    // the hardware yields quotient 1 for INT32_MAX / -32768 and the
    // emulation must follow it
    let (result, r1, r2, flags) = run_div(0x7FFF_FFFF, i16::MIN, 0);
    assert_eq!(result, Ok(()));
    assert_eq!(r2, 1);
    assert_eq!(r1, 0x7FFF);
    assert_eq!(flags, 0);
}

#[test]
fn div_exact_boundary_quotients() {
    let (result, _, r2, flags) = run_div(0xFFFF_8000, 1, 0);
    assert_eq!(result, Ok(()));
    assert_eq!(r2, 0x8000);
    assert_eq!(flags, FL_M);

    let (result, _, r2, flags) = run_div(0x0000_7FFF, 1, 0);
    assert_eq!(result, Ok(()));
    assert_eq!(r2, 0x7FFF);
    assert_eq!(flags, 0);
}
