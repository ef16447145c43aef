//! Floats lose five exponent bits to the tag field.
//!
//! ```text
//! f64:   [s][e10][e9..e5][e4..e0][ mantissa 52 ]
//! word:  [s][e10][e4..e0][ mantissa 52 ][ tag  ]
//! ```
//!
//! The dropped bits are rebuilt from `e10` and the tag:
//! - `FLOAT`:     `e9..e5` all equal to `e10`. Zero, subnormals, `|x| < 2^-991`,
//!   `|x| >= 2^993`, infinities and NaN.
//! - `FLOAT_RSV`: `e9..e5` all equal to `!e10`. `2^-31 <= |x| < 2^33`.
//!
//! Every other exponent is in the gap between the bands and stays on the heap.
use crate::{
    Object, Tag, Word,
    packers::Packer,
    tag::{SIGN_BIT, TAG_BITS},
};

const EXP_HIGH: u64 = 1 << 62;
const EXP_MID_SHIFT: u32 = 57;
const EXP_MID_MASK: u64 = 0x1F << EXP_MID_SHIFT;
const LOW_MASK: u64 = (1 << EXP_MID_SHIFT) - 1;
const KEPT_HIGH: u64 = SIGN_BIT | EXP_HIGH;

#[inline]
fn band(bits: u64) -> Option<Tag> {
    let high = if bits & EXP_HIGH != 0 { 0x1F } else { 0 };
    let mid = (bits & EXP_MID_MASK) >> EXP_MID_SHIFT;
    if mid == high {
        Some(Tag::Float)
    } else if mid == high ^ 0x1F {
        Some(Tag::FloatRsv)
    } else {
        None
    }
}

/// `None` when the exponent falls in the gap between the two bands.
#[inline]
pub fn pack(value: f64) -> Option<Word> {
    let bits = value.to_bits();
    let tag = band(bits)?;
    let payload = (bits & KEPT_HIGH) | ((bits & LOW_MASK) << TAG_BITS);
    Some(Word::make(tag, payload))
}

/// Caller guarantees the word carries `FLOAT` or `FLOAT_RSV`.
#[inline]
pub fn unpack(word: Word) -> f64 {
    let payload = word.payload();
    let high = payload & EXP_HIGH != 0;
    let mid = match (word.tag(), high) {
        (Some(Tag::Float), true) | (Some(Tag::FloatRsv), false) => EXP_MID_MASK,
        _ => 0,
    };
    let bits = (payload & KEPT_HIGH) | mid | ((payload >> TAG_BITS) & LOW_MASK);
    f64::from_bits(bits)
}

#[derive(Debug)]
pub struct FloatPacker;

impl Packer for FloatPacker {
    fn name(&self) -> &'static str {
        "float"
    }

    fn tags(&self) -> &[Tag] {
        &[Tag::Float, Tag::FloatRsv]
    }

    fn try_pack(&self, object: &Object) -> Option<Word> {
        match object {
            Object::Float(value) => pack(*value),
            _ => None,
        }
    }

    fn unpack(&self, word: Word) -> Object {
        Object::Float(unpack(word))
    }
}
