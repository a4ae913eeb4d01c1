//! Command-line calculator for the MERA-400 AWP floating-point format.
//!
//! Arguments are either plain floating-point numbers or triplets of 16-bit
//! words in the AWP storage format (each word `0x…` hex, `0b…` binary or
//! decimal); the two forms can be mixed. With no operation selected the
//! arguments are just converted and printed.

use awp_emu::flags::{FL_C, FL_M, FL_V, FL_Z};
use awp_emu::{AddSub, Awp, AwpError, FpStatus, from_double, to_double};
use clap::Parser;
use clap::error::ErrorKind;
use env_logger::Env;
use std::process;

#[derive(Debug, Parser)]
#[command(name = "emawp")]
struct Args {
    /// Normalize the argument
    #[arg(short = 'n')]
    norm: bool,

    /// Add the arguments
    #[arg(short = 'a')]
    add: bool,

    /// Subtract the second argument from the first
    #[arg(short = 's')]
    sub: bool,

    /// Multiply the arguments
    #[arg(short = 'm')]
    mul: bool,

    /// Divide the first argument by the second
    #[arg(short = 'd')]
    div: bool,

    /// Print an extra mantissa * 2^exponent line for each number
    #[arg(short = 'v')]
    verbose: bool,

    /// Operands: a floating-point number or three 16-bit words each
    args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Norm,
    Add,
    Sub,
    Mul,
    Div,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Self::Norm => "norm",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Parsed {
    Value(f64),
    Words([u16; 3]),
}

fn errexit(message: &str) -> ! {
    eprintln!("ERROR: {message}");
    process::exit(1);
}

fn parse_word(token: &str) -> Option<u16> {
    if let Some(hex) = token.strip_prefix("0x") {
        u16::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = token.strip_prefix("0b") {
        u16::from_str_radix(bin, 2).ok()
    } else {
        token.parse().ok()
    }
}

/// Split the positional arguments into `count` operands, each either a
/// single floating-point token or a triplet of word tokens.
fn parse_operands(tokens: &[String], count: usize) -> Option<Vec<Parsed>> {
    if count == 0 {
        return tokens.is_empty().then(Vec::new);
    }

    // a plain floating-point number first, then a word triplet
    if let Ok(value) = tokens.first()?.parse::<f64>() {
        if let Some(mut rest) = parse_operands(&tokens[1..], count - 1) {
            rest.insert(0, Parsed::Value(value));
            return Some(rest);
        }
    }

    if tokens.len() >= 3 {
        let words = (parse_word(&tokens[0]), parse_word(&tokens[1]), parse_word(&tokens[2]));
        if let (Some(w0), Some(w1), Some(w2)) = words {
            if let Some(mut rest) = parse_operands(&tokens[3..], count - 1) {
                rest.insert(0, Parsed::Words([w0, w1, w2]));
                return Some(rest);
            }
        }
    }

    None
}

fn status_name(result: Result<FpStatus, AwpError>) -> &'static str {
    match result {
        Ok(FpStatus::Ok) => "OK",
        Ok(FpStatus::Underflow) => "UDFLOW",
        Ok(FpStatus::Overflow) => "OVFLOW",
        Err(AwpError::QuotientOverflow) => "DIV_OF",
        Err(_) => "FP_ERR",
    }
}

#[derive(Debug, Clone, Copy)]
struct Num {
    flags: u16,
    words: [u16; 3],
    value: f64,
    status: &'static str,
    from_words: bool,
}

impl Num {
    fn new(parsed: Parsed) -> Self {
        match parsed {
            Parsed::Value(value) => {
                Self { flags: 0, words: [0; 3], value, status: "OK", from_words: false }
            }
            Parsed::Words(words) => {
                Self { flags: 0, words, value: 0.0, status: "OK", from_words: true }
            }
        }
    }

    /// Resolve the pending conversion and print one result line. After the
    /// call the number is in word form, ready to feed an operation.
    fn print(&mut self, name: &str, verbose: bool) {
        let arrow = if self.from_words { "->" } else { "<-" };

        if self.from_words {
            if let Ok(value) = to_double(self.words) {
                self.value = value;
            }
        } else {
            let mut words = [0; 3];
            self.status = status_name(from_double(&mut words, &mut self.flags, self.value, false));
            self.words = words;
            self.from_words = true;
        }

        let width = if self.value.abs() >= 1.0 { self.value.abs().log10() as usize } else { 0 };
        let precision = 42_usize.saturating_sub(width);

        println!(
            "{name:>4}:  {status:>6}  {z}{m}{c}{v}  0x{w0:04x} 0x{w1:04x} 0x{w2:04x}  {arrow}  {value:.precision$}",
            status = self.status,
            z = if self.flags & FL_Z != 0 { "Z" } else { "-" },
            m = if self.flags & FL_M != 0 { "M" } else { "-" },
            c = if self.flags & FL_C != 0 { "C" } else { "-" },
            v = if self.flags & FL_V != 0 { "V" } else { "-" },
            w0 = self.words[0],
            w1 = self.words[1],
            w2 = self.words[2],
            value = self.value,
        );

        if verbose {
            let e = (self.words[2] as u8) as i8;
            let m = (i64::from(self.words[0]) << 48)
                | (i64::from(self.words[1]) << 32)
                | (i64::from(self.words[2] & 0xFF00) << 16);
            let m_f = (m as f64) * (2.0_f64).powi(-63);
            println!("{:45}= {m_f:.42} * 2^{e}", "");
        }
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => process::exit(0),
            _ => process::exit(1),
        }
    });

    let mut selected = Vec::new();
    if args.norm {
        selected.push(Operation::Norm);
    }
    if args.add {
        selected.push(Operation::Add);
    }
    if args.sub {
        selected.push(Operation::Sub);
    }
    if args.mul {
        selected.push(Operation::Mul);
    }
    if args.div {
        selected.push(Operation::Div);
    }

    let operation = match selected[..] {
        [] => None,
        [operation] => Some(operation),
        _ => errexit("Only one operation can be specified"),
    };

    let operand_count = match operation {
        Some(Operation::Norm) | None => 1,
        Some(_) => 2,
    };

    let Some(parsed) = parse_operands(&args.args, operand_count) else {
        errexit("Wrong number of positional arguments for operation");
    };
    let mut nums: Vec<Num> = parsed.into_iter().map(Num::new).collect();

    nums[0].print("in1", args.verbose);
    if let Some(second) = nums.get_mut(1) {
        second.print("in2", args.verbose);
    }

    let Some(operation) = operation else {
        return;
    };

    let operand = nums.get(1).map(|num| num.words);
    let num = &mut nums[0];

    let result = {
        let [r1, r2, r3] = &mut num.words;
        let mut awp = Awp::new(&mut num.flags, r1, r2, r3);
        match operation {
            Operation::Norm => Ok(awp.float_norm()),
            Operation::Add => awp.float_addsub(operand.unwrap(), AddSub::Add),
            Operation::Sub => awp.float_addsub(operand.unwrap(), AddSub::Sub),
            Operation::Mul => awp.float_mul(operand.unwrap()),
            Operation::Div => awp.float_div(operand.unwrap()),
        }
    };

    num.status = status_name(result);
    num.print(operation.name(), args.verbose);
}
