//! Per-type packers, tried in priority order by the identity facade.
//!
//! A packer never fails loudly: a value it cannot represent is simply not packed
//! and goes to the heap instead.
mod boolean;
mod float;
mod integer;
mod range;
mod singleton;

pub use self::boolean::BoolPacker;
pub use self::float::FloatPacker;
pub use self::integer::IntPacker;
pub use self::range::RangePacker;
pub use self::singleton::SingletonPacker;

use crate::{Object, Tag, Word};

pub mod bits {
    //! Typed entry points, for callers that already know what they hold.
    pub use super::boolean::{pack as pack_bool, unpack as unpack_bool};
    pub use super::float::{pack as pack_float, unpack as unpack_float};
    pub use super::integer::{PAYLOAD_SHIFT as INT_SHIFT, pack as pack_int, unpack as unpack_int};
    pub use super::range::{pack as pack_range, unpack as unpack_range};
}

pub trait Packer: Sync {
    fn name(&self) -> &'static str;

    /// Tags this packer produces and is able to unpack.
    fn tags(&self) -> &[Tag];

    fn try_pack(&self, object: &Object) -> Option<Word>;

    /// Only valid for words carrying one of [`Packer::tags`].
    fn unpack(&self, word: Word) -> Object;
}

pub static NONE_PACKER: SingletonPacker = SingletonPacker::none();
pub static NOT_IMPLEMENTED_PACKER: SingletonPacker = SingletonPacker::not_implemented();

/// Priority order: singletons, bool, int, float, range.
pub static PACKERS: [&dyn Packer; 6] = [
    &NONE_PACKER,
    &NOT_IMPLEMENTED_PACKER,
    &BoolPacker,
    &IntPacker,
    &FloatPacker,
    &RangePacker,
];

/// First packer that accepts `object` wins.
pub fn pack(object: &Object) -> Option<Word> {
    PACKERS.iter().find_map(|packer| packer.try_pack(object))
}

pub fn packer_for(tag: Tag) -> Option<&'static dyn Packer> {
    PACKERS
        .iter()
        .copied()
        .find(|packer| packer.tags().contains(&tag))
}

/// `None` for heap words and for tags no packer claims.
pub fn unpack(word: Word) -> Option<Object> {
    let tag = word.tag()?;
    packer_for(tag).map(|packer| packer.unpack(word))
}
