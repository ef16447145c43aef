//! Word: the raw identity of an object, either a heap address or a packed value
//!
//! Tag: the low five bits of a packed word, selecting the packer that owns the payload
//!
//! Identity: decoded view of a word, the only way the rest of the crate looks at tag bits
//!
//! ```text
//! 63                                    5   4   3   2 1   0
//! [             payload                ] [v] [f] [ cat ] [0]
//! ```
//!
//! Heap cells are aligned past the tag field, so a heap address always has a zero tag.
use std::fmt;

pub const TAG_BITS: u32 = 5;
pub const TAG_MASK: u64 = (1 << TAG_BITS) - 1;

/// bits 1-2, non-zero for every assigned tag
pub const CATEGORY_MASK: u64 = 0b0_0110;
/// bit 3, separates `LONG`/`BOOL` from `FLOAT`/`FLOAT_RSV`
pub const FAMILY_BIT: u64 = 0b0_1000;
/// bit 4, separates the two members of a family
pub const VARIANT_BIT: u64 = 0b1_0000;

pub const SIGN_BIT: u64 = 1 << 63;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Long = 0x02,
    None = 0x04,
    NotImpl = 0x06,
    Float = 0x0A,
    Range = 0x0C,
    NotUsed0E = 0x0E,
    Bool = 0x12,
    NotUsed14 = 0x14,
    NotUsed16 = 0x16,
    FloatRsv = 0x1A,
    NotUsed1C = 0x1C,
    NotUsed1E = 0x1E,
}

impl Tag {
    pub const ALL: [Tag; 12] = [
        Tag::Long,
        Tag::None,
        Tag::NotImpl,
        Tag::Float,
        Tag::Range,
        Tag::NotUsed0E,
        Tag::Bool,
        Tag::NotUsed14,
        Tag::NotUsed16,
        Tag::FloatRsv,
        Tag::NotUsed1C,
        Tag::NotUsed1E,
    ];

    #[inline(always)]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn from_bits(bits: u8) -> Option<Tag> {
        match bits {
            0x02 => Some(Tag::Long),
            0x04 => Some(Tag::None),
            0x06 => Some(Tag::NotImpl),
            0x0A => Some(Tag::Float),
            0x0C => Some(Tag::Range),
            0x0E => Some(Tag::NotUsed0E),
            0x12 => Some(Tag::Bool),
            0x14 => Some(Tag::NotUsed14),
            0x16 => Some(Tag::NotUsed16),
            0x1A => Some(Tag::FloatRsv),
            0x1C => Some(Tag::NotUsed1C),
            0x1E => Some(Tag::NotUsed1E),
            _ => None,
        }
    }

    /// Slot of this tag in the type table.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize / 2
    }

    #[inline(always)]
    pub const fn category(self) -> u8 {
        self as u8 & CATEGORY_MASK as u8
    }

    /// Exported constant name, without the common prefix.
    pub const fn name(self) -> &'static str {
        match self {
            Tag::Long => "LONG",
            Tag::None => "NONE",
            Tag::NotImpl => "NOTIMPL",
            Tag::Float => "FLOAT",
            Tag::Range => "RANGE",
            Tag::NotUsed0E => "NOTUSED_0E",
            Tag::Bool => "BOOL",
            Tag::NotUsed14 => "NOTUSED_14",
            Tag::NotUsed16 => "NOTUSED_16",
            Tag::FloatRsv => "FLOAT_RSV",
            Tag::NotUsed1C => "NOTUSED_1C",
            Tag::NotUsed1E => "NOTUSED_1E",
        }
    }
}

/// A pointer sized identity word
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Word(u64);

/// Decoded form of a [`Word`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Identity {
    Packed(Tag),
    Heap(u64),
    /// non-zero tag bits that no tag claims
    Invalid(u8),
}

impl Word {
    #[inline(always)]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline(always)]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Combine a tag with a payload that has already been shifted past the tag field.
    #[inline(always)]
    pub const fn make(tag: Tag, payload: u64) -> Self {
        debug_assert!(payload & TAG_MASK == 0, "payload overlaps the tag field");
        Self(payload | tag as u64)
    }

    #[inline]
    pub fn from_address(address: u64) -> Self {
        debug_assert_eq!(
            address & TAG_MASK,
            0,
            "heap address must be aligned past the tag field"
        );
        Self(address)
    }

    #[inline(always)]
    pub const fn tag_bits(self) -> u8 {
        (self.0 & TAG_MASK) as u8
    }

    /// Payload bits in place, tag field cleared.
    #[inline(always)]
    pub const fn payload(self) -> u64 {
        self.0 & !TAG_MASK
    }

    #[inline]
    pub const fn tag(self) -> Option<Tag> {
        Tag::from_bits(self.tag_bits())
    }

    #[inline]
    pub const fn is_packed(self) -> bool {
        self.tag().is_some()
    }

    #[inline]
    pub const fn is_heap(self) -> bool {
        self.tag_bits() == 0
    }

    pub const fn identity(self) -> Identity {
        match self.tag_bits() {
            0 => Identity::Heap(self.0),
            bits => match Tag::from_bits(bits) {
                Some(tag) => Identity::Packed(tag),
                None => Identity::Invalid(bits),
            },
        }
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity() {
            Identity::Packed(tag) => write!(f, "Packed({}, 0x{:016x})", tag.name(), self.0),
            Identity::Heap(address) => write!(f, "Heap(0x{address:x})"),
            Identity::Invalid(bits) => write!(f, "Invalid(0x{:016x}, tag 0x{bits:02x})", self.0),
        }
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl fmt::LowerHex for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl From<Word> for u64 {
    fn from(value: Word) -> Self {
        value.0
    }
}
