use crate::{Object, Tag, Word, packers::Packer};

/// The integer lives in the upper half of the word: `id(n) == n << 32 | LONG`.
pub const PAYLOAD_SHIFT: u32 = 32;

/// `None` when the value needs more than the payload half of the word.
#[inline]
pub fn pack(value: i64) -> Option<Word> {
    let narrow = i32::try_from(value).ok()?;
    let payload = (i64::from(narrow) << PAYLOAD_SHIFT).cast_unsigned();
    Some(Word::make(Tag::Long, payload))
}

#[inline]
pub const fn unpack(word: Word) -> i64 {
    word.raw().cast_signed() >> PAYLOAD_SHIFT
}

#[derive(Debug)]
pub struct IntPacker;

impl Packer for IntPacker {
    fn name(&self) -> &'static str {
        "int"
    }

    fn tags(&self) -> &[Tag] {
        &[Tag::Long]
    }

    fn try_pack(&self, object: &Object) -> Option<Word> {
        match object {
            Object::Int(value) => pack(*value),
            _ => None,
        }
    }

    fn unpack(&self, word: Word) -> Object {
        Object::Int(unpack(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_value_shifted_past_the_tag() {
        let word = pack(20).expect("small");
        assert_eq!(word.raw() % 32, 0x02);
        assert_eq!(word.raw(), (20 << 32) | 0x02);
        assert_eq!(pack(0).map(Word::raw), Some(0x02));
    }

    #[test]
    fn round_trip_at_the_edges() {
        for n in [0, 1, -1, 12000, i64::from(i32::MAX), i64::from(i32::MIN)] {
            let word = pack(n).unwrap_or_else(|| panic!("{n} should pack"));
            assert_eq!(unpack(word), n);
            assert_eq!(word.tag(), Some(Tag::Long));
        }
    }

    #[test]
    fn values_outside_the_payload_are_refused() {
        assert_eq!(pack(i64::from(i32::MAX) + 1), None);
        assert_eq!(pack(i64::from(i32::MIN) - 1), None);
        assert_eq!(pack(i64::MAX), None);
    }

    #[test]
    fn equal_products_share_identity() {
        assert_eq!(pack(40 * 300), pack(-600 * -20));
        assert_ne!(pack(12000), pack(12001));
    }

    #[test]
    fn negative_values_keep_their_sign() {
        let word = pack(-5).unwrap();
        assert_eq!(word.raw() >> 32, 0xFFFF_FFFB);
        assert_eq!(unpack(word), -5);
    }
}
