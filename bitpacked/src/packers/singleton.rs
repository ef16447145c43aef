use crate::{Object, Tag, Word, packers::Packer};

/// `None` and `NotImplemented`: one identity each, the bare tag.
#[derive(Debug)]
pub struct SingletonPacker {
    tag: [Tag; 1],
    name: &'static str,
}

impl SingletonPacker {
    pub const fn none() -> Self {
        Self {
            tag: [Tag::None],
            name: "none",
        }
    }

    pub const fn not_implemented() -> Self {
        Self {
            tag: [Tag::NotImpl],
            name: "notimplemented",
        }
    }

    #[inline]
    pub const fn word(&self) -> Word {
        Word::make(self.tag[0], 0)
    }

    fn object(&self) -> Object {
        match self.tag[0] {
            Tag::NotImpl => Object::NotImplemented,
            _ => Object::None,
        }
    }
}

impl Packer for SingletonPacker {
    fn name(&self) -> &'static str {
        self.name
    }

    fn tags(&self) -> &[Tag] {
        &self.tag
    }

    fn try_pack(&self, object: &Object) -> Option<Word> {
        match (self.tag[0], object) {
            (Tag::None, Object::None) | (Tag::NotImpl, Object::NotImplemented) => Some(self.word()),
            _ => None,
        }
    }

    fn unpack(&self, word: Word) -> Object {
        debug_assert_eq!(word, self.word());
        self.object()
    }
}
