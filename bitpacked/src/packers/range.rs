//! Small ranges are stored by their canonical `(start, step, len)` triple, so
//! equal sequences built in different ways end up with one identity.
//!
//! ```text
//! 63        40 39      24 23       5 4   0
//! [ start 24 ] [ step 16 ] [ len 19 ] [tag]
//! ```
use crate::{Object, Range, Tag, Word, packers::Packer};

const LEN_SHIFT: u32 = 5;
const LEN_BITS: u32 = 19;
const STEP_SHIFT: u32 = 24;
const STEP_BITS: u32 = 16;
const START_SHIFT: u32 = 40;
const START_BITS: u32 = 24;

#[inline]
const fn field_mask(bits: u32) -> u64 {
    (1 << bits) - 1
}

#[inline]
fn fits_signed(value: i64, bits: u32) -> bool {
    let limit = 1i64 << (bits - 1);
    (-limit..limit).contains(&value)
}

/// `None` when any part of the canonical triple overflows its field.
pub fn pack(range: &Range) -> Option<Word> {
    let (start, step, len) = range.canonical();
    if !fits_signed(start, START_BITS) || !fits_signed(step, STEP_BITS) || len >> LEN_BITS != 0 {
        return None;
    }
    let payload = ((start.cast_unsigned() & field_mask(START_BITS)) << START_SHIFT)
        | ((step.cast_unsigned() & field_mask(STEP_BITS)) << STEP_SHIFT)
        | (len << LEN_SHIFT);
    Some(Word::make(Tag::Range, payload))
}

pub fn unpack(word: Word) -> Range {
    let raw = word.raw();
    let start = raw.cast_signed() >> START_SHIFT;
    let step = (raw << (64 - STEP_SHIFT - STEP_BITS)).cast_signed() >> (64 - STEP_BITS);
    let len = (raw >> LEN_SHIFT) & field_mask(LEN_BITS);
    Range::from_canonical(start, step, len)
}

#[derive(Debug)]
pub struct RangePacker;

impl Packer for RangePacker {
    fn name(&self) -> &'static str {
        "range"
    }

    fn tags(&self) -> &[Tag] {
        &[Tag::Range]
    }

    fn try_pack(&self, object: &Object) -> Option<Word> {
        match object {
            Object::Range(range) => pack(range),
            _ => None,
        }
    }

    fn unpack(&self, word: Word) -> Object {
        Object::Range(unpack(word))
    }
}
