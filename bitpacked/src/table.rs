use crate::{ObjectType, Tag, tag::TAG_BITS};

pub const TABLE_SLOTS: usize = 1 << (TAG_BITS - 1);

/// Tag to type lookup, indexed by `tag / 2`.
///
/// Slots whose index is a multiple of four belong to tags that are multiples of
/// eight and stay empty forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTable {
    slots: [Option<ObjectType>; TABLE_SLOTS],
}

const fn type_of_tag(tag: Tag) -> ObjectType {
    match tag {
        Tag::Long => ObjectType::Int,
        Tag::Bool => ObjectType::Bool,
        Tag::Float | Tag::FloatRsv => ObjectType::Float,
        Tag::None => ObjectType::NoneType,
        Tag::NotImpl => ObjectType::NotImplementedType,
        Tag::Range => ObjectType::Range,
        Tag::NotUsed0E | Tag::NotUsed14 | Tag::NotUsed16 | Tag::NotUsed1C | Tag::NotUsed1E => {
            ObjectType::Reserved
        }
    }
}

impl TypeTable {
    pub fn build() -> Self {
        let mut slots = [None; TABLE_SLOTS];
        for tag in Tag::ALL {
            slots[tag.index()] = Some(type_of_tag(tag));
        }
        Self { slots }
    }

    /// Type for raw tag bits, `None` for reserved or out of range bits.
    #[inline]
    pub fn type_for(&self, tag_bits: u8) -> Option<ObjectType> {
        if tag_bits & 1 != 0 {
            return None;
        }
        self.slots.get(usize::from(tag_bits) / 2).copied().flatten()
    }

    #[inline]
    pub fn type_for_tag(&self, tag: Tag) -> ObjectType {
        self.slots[tag.index()].unwrap_or(type_of_tag(tag))
    }

    pub fn entries(&self) -> &[Option<ObjectType>; TABLE_SLOTS] {
        &self.slots
    }

    pub fn resolved(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_slots_resolve_four_stay_empty() {
        let table = TypeTable::build();
        assert_eq!(table.entries().len(), 16);
        assert_eq!(table.resolved(), 12);
        for index in (0..16).step_by(4) {
            assert_eq!(table.entries()[index], None, "slot {index}");
        }
    }

    #[test]
    fn assigned_tags_map_to_their_types() {
        let table = TypeTable::build();
        let lookup = |tag: Tag| table.entries()[tag.bits() as usize / 2];
        assert_eq!(lookup(Tag::Long), Some(ObjectType::Int));
        assert_eq!(lookup(Tag::Bool), Some(ObjectType::Bool));
        assert_eq!(lookup(Tag::Float), Some(ObjectType::Float));
        assert_eq!(lookup(Tag::FloatRsv), Some(ObjectType::Float));
        assert_eq!(lookup(Tag::None), Some(ObjectType::NoneType));
        assert_eq!(lookup(Tag::NotImpl), Some(ObjectType::NotImplementedType));
        assert_eq!(lookup(Tag::Range), Some(ObjectType::Range));
        assert_eq!(lookup(Tag::NotUsed1E), Some(ObjectType::Reserved));
    }

    #[test]
    fn type_for_rejects_reserved_and_odd_bits() {
        let table = TypeTable::build();
        for bits in [0u8, 8, 16, 24, 3, 0x11, 0x20, 0xFF] {
            assert_eq!(table.type_for(bits), None, "bits {bits:#x}");
        }
        assert_eq!(table.type_for(0x12), Some(ObjectType::Bool));
        assert_eq!(table.type_for_tag(Tag::FloatRsv), ObjectType::Float);
    }
}
