use crate::{Object, Tag, Word, packers::Packer};

/// Same family as integers, other variant: `id(1) ^ id(True) == 0x10`.
const PAYLOAD_SHIFT: u32 = 32;

#[inline]
pub const fn pack(value: bool) -> Word {
    Word::make(Tag::Bool, (value as u64) << PAYLOAD_SHIFT)
}

#[inline]
pub const fn unpack(word: Word) -> bool {
    word.payload() >> PAYLOAD_SHIFT != 0
}

#[derive(Debug)]
pub struct BoolPacker;

impl Packer for BoolPacker {
    fn name(&self) -> &'static str {
        "bool"
    }

    fn tags(&self) -> &[Tag] {
        &[Tag::Bool]
    }

    fn try_pack(&self, object: &Object) -> Option<Word> {
        match object {
            Object::Bool(value) => Some(pack(*value)),
            _ => None,
        }
    }

    fn unpack(&self, word: Word) -> Object {
        Object::Bool(unpack(word))
    }
}
