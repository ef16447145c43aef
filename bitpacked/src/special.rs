use crate::{Heap, Object, Word};

/// Number of cached negative ints, `-NSMALLNEGINTS..0`.
pub const NSMALLNEGINTS: i64 = 5;
/// Number of cached non-negative ints, `0..NSMALLPOSINTS`.
pub const NSMALLPOSINTS: i64 = 257;

/// Well-known objects shared by every reference when packing is off.
///
/// Each one lives in an immortal heap cell allocated by [`SpecialObjects::bootstrap`].
/// Looking one up does not bump its count; the caller does that.
#[derive(Debug)]
pub struct SpecialObjects {
    /// The canonical `None` object.
    pub none: Word,

    /// The canonical `NotImplemented` object.
    pub not_implemented: Word,

    /// The canonical `True` object.
    pub true_obj: Word,

    /// The canonical `False` object.
    pub false_obj: Word,

    /// `-NSMALLNEGINTS..NSMALLPOSINTS`, in order.
    pub small_ints: Box<[Word]>,
}

impl SpecialObjects {
    pub fn bootstrap(heap: &Heap) -> Self {
        let small_ints = (-NSMALLNEGINTS..NSMALLPOSINTS)
            .map(|n| heap.allocate_immortal(Object::Int(n)))
            .collect();
        let specials = Self {
            none: heap.allocate_immortal(Object::None),
            not_implemented: heap.allocate_immortal(Object::NotImplemented),
            true_obj: heap.allocate_immortal(Object::Bool(true)),
            false_obj: heap.allocate_immortal(Object::Bool(false)),
            small_ints,
        };
        log::debug!("bootstrapped {} special objects", specials.len());
        specials
    }

    pub fn small_int(&self, n: i64) -> Option<Word> {
        if !(-NSMALLNEGINTS..NSMALLPOSINTS).contains(&n) {
            return None;
        }
        self.small_ints.get(usize::try_from(n + NSMALLNEGINTS).ok()?).copied()
    }

    /// The shared cell for `object`, if it has one.
    pub fn lookup(&self, object: &Object) -> Option<Word> {
        match object {
            Object::None => Some(self.none),
            Object::NotImplemented => Some(self.not_implemented),
            Object::Bool(true) => Some(self.true_obj),
            Object::Bool(false) => Some(self.false_obj),
            Object::Int(n) => self.small_int(*n),
            _ => None,
        }
    }

    /// Number of cells allocated by [`SpecialObjects::bootstrap`].
    pub(crate) fn len(&self) -> usize {
        4 + self.small_ints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singletons_are_shared() {
        let heap = Heap::new();
        let specials = SpecialObjects::bootstrap(&heap);
        assert_eq!(specials.lookup(&Object::None), Some(specials.none));
        assert_eq!(specials.lookup(&Object::Bool(true)), Some(specials.true_obj));
        assert_ne!(specials.true_obj, specials.false_obj);
        assert_eq!(heap.len(), specials.len());
        assert_eq!(heap.with_object(specials.none, Object::clone), Some(Object::None));
    }

    #[test]
    fn small_int_cache_bounds() {
        let heap = Heap::new();
        let specials = SpecialObjects::bootstrap(&heap);
        assert_eq!(specials.small_ints.len(), 262);
        assert!(specials.small_int(-5).is_some());
        assert!(specials.small_int(256).is_some());
        assert_eq!(specials.small_int(-6), None);
        assert_eq!(specials.small_int(257), None);
        assert_eq!(
            heap.with_object(specials.small_int(42).unwrap(), Object::clone),
            Some(Object::Int(42))
        );
        assert_eq!(specials.lookup(&Object::Int(1234)), None);
        assert_eq!(specials.lookup(&Object::Float(1.0)), None);
    }
}
