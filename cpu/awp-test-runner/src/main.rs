//! Runs AWP test vectors from JSON descriptions.
//!
//! Each file holds an array of tests; a test gives the initial register
//! and flags state, the operation with its operand, and the expected final
//! state plus result code. For error results the final state must equal
//! the initial state, mirroring the hardware contract that failed
//! operations leave the registers alone.

use awp_emu::{AddSub, Awp, AwpError, FpStatus};
use clap::Parser;
use env_logger::Env;
use serde::Deserialize;
use std::error::Error;
use std::ffi::OsStr;
use std::path::Path;
use std::{fs, process};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
struct State {
    flags: u16,
    r1: u16,
    r2: u16,
    r3: u16,
}

macro_rules! diff_field {
    ($actual:expr, $expected:expr, $field:ident) => {
        if $actual.$field != $expected.$field {
            log::info!(
                "  {}: actual={:04X}, expected={:04X}",
                stringify!($field),
                $actual.$field,
                $expected.$field
            );
        }
    };
}

impl State {
    fn diff(self, expected: State) {
        diff_field!(self, expected, flags);
        diff_field!(self, expected, r1);
        diff_field!(self, expected, r2);
        diff_field!(self, expected, r3);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
    FloatNorm,
    FloatAdd,
    FloatSub,
    FloatMul,
    FloatDiv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Outcome {
    Ok,
    Underflow,
    Overflow,
    QuotientOverflow,
    Denormalized,
    DivideByZero,
}

impl From<Result<FpStatus, AwpError>> for Outcome {
    fn from(result: Result<FpStatus, AwpError>) -> Self {
        match result {
            Ok(FpStatus::Ok) => Self::Ok,
            Ok(FpStatus::Underflow) => Self::Underflow,
            Ok(FpStatus::Overflow) => Self::Overflow,
            Err(AwpError::QuotientOverflow) => Self::QuotientOverflow,
            Err(AwpError::DenormalizedOperand | AwpError::NotFinite) => Self::Denormalized,
            Err(AwpError::DivideByZero) => Self::DivideByZero,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TestDescription {
    name: String,
    op: Op,
    initial: State,
    #[serde(default)]
    operand: Vec<u16>,
    #[serde(rename = "final")]
    final_: State,
    status: Outcome,
}

fn operand_pair(operand: &[u16]) -> [u16; 2] {
    operand.try_into().expect("operand must be two words")
}

fn operand_triplet(operand: &[u16]) -> [u16; 3] {
    operand.try_into().expect("operand must be three words")
}

fn operand_single(operand: &[u16]) -> i16 {
    match operand {
        &[n] => n as i16,
        _ => panic!("operand must be one word"),
    }
}

fn run_test(description: &TestDescription) -> bool {
    let State { mut flags, mut r1, mut r2, mut r3 } = description.initial;

    let outcome = {
        let mut awp = Awp::new(&mut flags, &mut r1, &mut r2, &mut r3);
        let operand = &description.operand;
        match description.op {
            Op::Add => {
                awp.dword_addsub(operand_pair(operand), AddSub::Add);
                Outcome::Ok
            }
            Op::Sub => {
                awp.dword_addsub(operand_pair(operand), AddSub::Sub);
                Outcome::Ok
            }
            Op::Mul => {
                awp.dword_mul(operand_single(operand));
                Outcome::Ok
            }
            Op::Div => awp.dword_div(operand_single(operand)).map(|()| FpStatus::Ok).into(),
            Op::FloatNorm => Ok::<_, AwpError>(awp.float_norm()).into(),
            Op::FloatAdd => awp.float_addsub(operand_triplet(operand), AddSub::Add).into(),
            Op::FloatSub => awp.float_addsub(operand_triplet(operand), AddSub::Sub).into(),
            Op::FloatMul => awp.float_mul(operand_triplet(operand)).into(),
            Op::FloatDiv => awp.float_div(operand_triplet(operand)).into(),
        }
    };

    let actual = State { flags, r1, r2, r3 };
    let passed = actual == description.final_ && outcome == description.status;
    if !passed {
        log::info!("failed: {}", description.name);
        if outcome != description.status {
            log::info!("  status: actual={outcome:?}, expected={:?}", description.status);
        }
        actual.diff(description.final_);
    }

    passed
}

fn run_file(path: &Path) -> Result<(u32, u32), Box<dyn Error>> {
    let contents = fs::read_to_string(path)?;
    let descriptions: Vec<TestDescription> = serde_json::from_str(&contents)?;

    let mut passed = 0;
    let mut failed = 0;
    for description in &descriptions {
        if run_test(description) {
            passed += 1;
        } else {
            failed += 1;
        }
    }

    log::info!("{}: {passed} passed, {failed} failed", path.display());

    Ok((passed, failed))
}

#[derive(Debug, Clone, Parser)]
struct Args {
    #[arg(short = 'f', long)]
    file_path: Option<String>,
    #[arg(short = 'd', long)]
    directory_path: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let (passed, failed) = match (args.file_path, args.directory_path) {
        (Some(file_path), None) => run_file(Path::new(&file_path))?,
        (None, Some(directory_path)) => {
            let mut passed = 0;
            let mut failed = 0;
            for entry in fs::read_dir(&directory_path)? {
                let path = entry?.path();
                if path.extension().and_then(OsStr::to_str) == Some("json") {
                    let (p, f) = run_file(&path)?;
                    passed += p;
                    failed += f;
                }
            }
            (passed, failed)
        }
        _ => {
            eprintln!(
                "ERROR: Exactly one of -f and -d must be set; use -h to see full help output"
            );
            process::exit(1);
        }
    };

    log::info!("total: {passed} passed, {failed} failed");

    if failed != 0 {
        process::exit(1);
    }

    Ok(())
}
