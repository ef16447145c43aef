use thiserror::Error;

use crate::Word;

/// Build or startup invariant violations. These are fatal and surface before a
/// [`Mode`](crate::Mode) is published.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("packing needs a 64-bit word, this target has {bits} bits")]
    WordTooNarrow { bits: u32 },
    #[error("tag {tag:#04x} does not fit a {width}-bit tag field")]
    TagFieldTooNarrow { tag: u8, width: u32 },
    #[error("heap cells are aligned to {align} bytes, the tag field needs {required}")]
    HeapAlignmentTooSmall { align: usize, required: usize },
    #[error("invalid value {value:?} for {name}, expected 0/1/true/false/on/off/yes/no")]
    InvalidVariable { name: &'static str, value: String },
    #[error("the process-wide mode is already installed")]
    AlreadyInstalled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("no live heap object at {0}")]
    UnknownIdentity(Word),
    #[error("{0} carries an unassigned tag")]
    InvalidTag(Word),
    #[error("reference count of {0} would drop below zero")]
    RefcountUnderflow(Word),
    #[error("{0} is not a list")]
    NotAList(Word),
    #[error("{0} is not a range")]
    NotARange(Word),
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("range() arg 3 must not be zero")]
    RangeStepZero,
    #[error("slice step cannot be zero")]
    SliceStepZero,
    #[error("integer overflow in range arithmetic")]
    Overflow,
    #[error("cannot parse {0:?} as a literal")]
    InvalidLiteral(String),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
