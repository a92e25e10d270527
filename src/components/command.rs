/*
 * Control Command Dispatcher
 *
 * Interprets one write to the control file:
 *
 *   set <register> <value>
 *   setbit <register> <bit> <0|1>
 *
 * The text protocol has no error channel. Anything malformed, unknown or
 * out of range is dropped without side effects and the whole write is
 * still reported as consumed. The reason a command was dropped is kept in
 * the returned `Outcome` and logged at debug level.
 */

use core::fmt;

use super::tokenizer::tokenize;
use crate::drivers::pm::accessor::{AccessError, RegisterAccessor};
use crate::drivers::pm::registers::RegisterTable;
use crate::io::PortBus;

/// Longest command examined per write; the rest of the write is ignored.
pub const MAX_COMMAND_LEN: usize = 127;
/// Maximum number of tokens scanned per command.
pub const MAX_ARGS: usize = 12;

/// What a write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Wrote { register: &'static str, value: u32 },
    BitSet { register: &'static str, bit: u32, value: u32 },
    Ignored(Rejection),
}

/// Why a write did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    UnknownCommand,
    MissingArguments,
    UnknownRegister,
    BadNumber,
    BitOutOfRange,
    ValueOutOfRange,
    InvalidGroup,
}

impl From<AccessError> for Rejection {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::InvalidGroup(_) => Rejection::InvalidGroup,
            AccessError::BitOutOfRange(_) => Rejection::BitOutOfRange,
            AccessError::ValueOutOfRange(_) => Rejection::ValueOutOfRange,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rejection::Empty => "empty command",
            Rejection::UnknownCommand => "unknown command",
            Rejection::MissingArguments => "missing arguments",
            Rejection::UnknownRegister => "unknown register",
            Rejection::BadNumber => "not a number",
            Rejection::BitOutOfRange => "bit index out of range",
            Rejection::ValueOutOfRange => "bit value out of range",
            Rejection::InvalidGroup => "register not addressable",
        })
    }
}

/// Result of a dispatch. `consumed` is always the full write length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatched {
    pub consumed: usize,
    pub outcome: Outcome,
}

#[derive(Clone, Copy)]
enum Command {
    Set,
    SetBit,
}

impl Command {
    fn parse(keyword: &[u8]) -> Option<Self> {
        match keyword {
            b"set" => Some(Command::Set),
            b"setbit" => Some(Command::SetBit),
            _ => None,
        }
    }

    /// Tokens required, keyword included.
    fn arity(self) -> usize {
        match self {
            Command::Set => 3,
            Command::SetBit => 4,
        }
    }
}

/// Runs control commands against a register accessor.
pub struct CommandDispatcher<'a, 'r, B: PortBus> {
    accessor: &'a RegisterAccessor<'r, B>,
    table: &'static RegisterTable,
}

impl<'a, 'r, B: PortBus> CommandDispatcher<'a, 'r, B> {
    pub fn new(accessor: &'a RegisterAccessor<'r, B>, table: &'static RegisterTable) -> Self {
        Self { accessor, table }
    }

    /// Execute one control-file write.
    pub fn dispatch(&self, input: &[u8]) -> Dispatched {
        let line = &input[..input.len().min(MAX_COMMAND_LEN)];
        let outcome = match self.execute(line) {
            Ok(done) => done,
            Err(why) => {
                log::debug!("pm: ignoring command ({})", why);
                Outcome::Ignored(why)
            }
        };
        Dispatched {
            consumed: input.len(),
            outcome,
        }
    }

    fn execute(&self, line: &[u8]) -> Result<Outcome, Rejection> {
        let args = tokenize::<MAX_ARGS>(line);
        let keyword = args.first().ok_or(Rejection::Empty)?;
        let command = Command::parse(keyword).ok_or(Rejection::UnknownCommand)?;
        if args.len() < 2 {
            return Err(Rejection::MissingArguments);
        }
        let reg = self.table.lookup(args[1]).ok_or(Rejection::UnknownRegister)?;
        if args.len() < command.arity() {
            return Err(Rejection::MissingArguments);
        }

        match command {
            Command::Set => {
                // %i into a u32: keep the low 32 bits, so "-1" is all ones.
                let value = parse_integer(args[2]).ok_or(Rejection::BadNumber)? as u32;
                self.accessor.write(reg, value)?;
                Ok(Outcome::Wrote {
                    register: reg.name,
                    value,
                })
            }
            Command::SetBit => {
                let bit = parse_integer(args[2]).ok_or(Rejection::BadNumber)?;
                let value = parse_integer(args[3]).ok_or(Rejection::BadNumber)?;
                let bit = u32::try_from(bit).map_err(|_| Rejection::BitOutOfRange)?;
                let value = u32::try_from(value).map_err(|_| Rejection::ValueOutOfRange)?;
                self.accessor.set_bit(reg, bit, value)?;
                Ok(Outcome::BitSet {
                    register: reg.name,
                    bit,
                    value,
                })
            }
        }
    }
}

/// Parse an integer the way C's `%i` conversion does.
///
/// Leading spaces and an optional sign are skipped; `0x`/`0X` selects hex,
/// a leading `0` octal, anything else decimal. The longest valid prefix is
/// used, so `"12abc"` is 12 and `"0x"` is 0. Returns `None` when no digit
/// is present. Magnitudes past `i64` saturate.
pub fn parse_integer(token: &[u8]) -> Option<i64> {
    let mut rest = token;
    while let [b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c, tail @ ..] = rest {
        rest = tail;
    }

    let negative = match rest {
        [b'-', tail @ ..] => {
            rest = tail;
            true
        }
        [b'+', tail @ ..] => {
            rest = tail;
            false
        }
        _ => false,
    };

    let radix = match rest {
        [b'0', b'x' | b'X', d, ..] if d.is_ascii_hexdigit() => {
            rest = &rest[2..];
            16
        }
        [b'0', ..] => 8,
        _ => 10,
    };

    let digits = rest
        .iter()
        .map_while(|&b| (b as char).to_digit(radix))
        .fold(None, |acc: Option<i64>, d| {
            Some(acc.unwrap_or(0).saturating_mul(radix as i64).saturating_add(d as i64))
        })?;

    Some(if negative { digits.saturating_neg() } else { digits })
}
