//! The identity and refcount facade the rest of an object runtime talks to.
//!
//! A [`Runtime`] owns the heap and, depending on its [`Mode`], either the type
//! table and simulated counts for packed values or the special object cells
//! used when packing is off.
use crate::{
    Heap, Identity, Mode, Object, ObjectType, RuntimeError, RuntimeResult, Slice, Tag, TypeTable,
    Word,
    heap::Released,
    packers,
    refcount::{DUMMY_REFCNT, RefcountSource, SimulatedCounts},
    special::SpecialObjects,
};

#[derive(Debug)]
pub struct Runtime {
    mode: Mode,
    table: Option<TypeTable>,
    heap: Heap,
    specials: Option<SpecialObjects>,
    counts: SimulatedCounts,
}

impl Runtime {
    pub fn new(mode: Mode) -> Self {
        let heap = Heap::new();
        let (table, specials) = if mode.is_packing() {
            (Some(TypeTable::build()), None)
        } else {
            (None, Some(SpecialObjects::bootstrap(&heap)))
        };
        log::debug!(
            "runtime up, mode word {:#06b}, {} table slots resolved",
            mode.mode_word().bits(),
            table.as_ref().map_or(0, TypeTable::resolved)
        );
        Self {
            mode,
            table,
            heap,
            specials,
            counts: SimulatedCounts::new(),
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Absent when packing is off.
    pub fn type_table(&self) -> Option<&TypeTable> {
        self.table.as_ref()
    }

    pub fn tag_constants(&self) -> &'static [Tag] {
        let tags: &'static [Tag] = &Tag::ALL;
        if self.mode.is_packing() { tags } else { &[] }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Give `object` an identity. The caller owns one new reference to it.
    ///
    /// A list takes a reference to each of its items, as if they were appended.
    pub fn identity_of(&self, object: Object) -> Word {
        if let Object::List(items) = &object {
            for item in items {
                if let Err(err) = self.retain(*item) {
                    log::warn!("list item {item} not retained: {err}");
                }
            }
        }
        if self.mode.is_packing() {
            if let Some(word) = packers::pack(&object) {
                if self.mode.simulates_refcounts() {
                    self.counts.increment(word);
                }
                return word;
            }
            log::trace!("{} does not pack, allocating", object.object_type());
        } else if let Some(word) = self
            .specials
            .as_ref()
            .and_then(|specials| specials.lookup(&object))
        {
            match self.heap.retain(word) {
                Ok(_) => return word,
                Err(err) => log::warn!("special object lost: {err}"),
            }
        }
        self.heap.allocate(object)
    }

    pub fn type_of(&self, word: Word) -> Option<ObjectType> {
        match word.identity() {
            Identity::Packed(tag) => self.table.as_ref().map(|table| table.type_for_tag(tag)),
            Identity::Heap(_) => self.heap.object_type(word),
            Identity::Invalid(_) => None,
        }
    }

    /// The value behind `word`, unpacked or copied out of its cell.
    pub fn resolve(&self, word: Word) -> RuntimeResult<Object> {
        match word.identity() {
            Identity::Heap(_) => self
                .heap
                .with_object(word, Object::clone)
                .ok_or(RuntimeError::UnknownIdentity(word)),
            Identity::Packed(_) if self.mode.is_packing() => {
                packers::unpack(word).ok_or(RuntimeError::InvalidTag(word))
            }
            Identity::Packed(_) | Identity::Invalid(_) => Err(RuntimeError::InvalidTag(word)),
        }
    }

    pub fn refcount_of(&self, word: Word) -> RuntimeResult<usize> {
        match RefcountSource::of(&self.mode, word) {
            RefcountSource::Heap => self
                .heap
                .refcount(word)
                .ok_or(RuntimeError::UnknownIdentity(word)),
            RefcountSource::Simulated => {
                self.expect_packed(word)?;
                Ok(self.counts.count(word))
            }
            RefcountSource::Sentinel => {
                self.expect_packed(word)?;
                Ok(DUMMY_REFCNT)
            }
        }
    }

    pub fn retain(&self, word: Word) -> RuntimeResult<()> {
        let result = match RefcountSource::of(&self.mode, word) {
            RefcountSource::Heap => self.heap.retain(word).map(|_| ()),
            RefcountSource::Simulated => self.expect_packed(word).map(|()| {
                self.counts.increment(word);
            }),
            RefcountSource::Sentinel => self.expect_packed(word),
        };
        self.checked(result)
    }

    /// Drop one reference. A list freed here releases everything it held.
    ///
    /// Every pending identity is released even when one of them fails; the first
    /// failure is reported.
    pub fn release(&self, word: Word) -> RuntimeResult<()> {
        let mut pending = vec![word];
        let mut first_error = None;
        while let Some(word) = pending.pop() {
            let result = match RefcountSource::of(&self.mode, word) {
                RefcountSource::Heap => match self.heap.release(word) {
                    Ok(Released::Freed(Object::List(items))) => {
                        pending.extend(items);
                        Ok(())
                    }
                    Ok(_) => Ok(()),
                    Err(err) => Err(err),
                },
                RefcountSource::Simulated => self
                    .expect_packed(word)
                    .and_then(|()| self.counts.decrement(word).map(|_| ())),
                RefcountSource::Sentinel => self.expect_packed(word),
            };
            if let Err(err) = self.checked(result) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn new_list(&self) -> Word {
        self.heap.allocate(Object::List(Vec::new()))
    }

    /// Append `item`, the list taking a reference of its own.
    pub fn list_append(&self, list: Word, item: Word) -> RuntimeResult<()> {
        self.expect_list(list)?;
        self.retain(item)?;
        let pushed = self.heap.with_object_mut(list, |object| match object {
            Object::List(items) => {
                items.push(item);
                true
            }
            _ => false,
        });
        if pushed == Some(true) {
            return Ok(());
        }
        self.release(item)?;
        Err(RuntimeError::NotAList(list))
    }

    /// Borrowed: the list keeps the reference.
    pub fn list_get(&self, list: Word, index: i64) -> RuntimeResult<Word> {
        self.expect_list(list)?;
        self.heap
            .with_object(list, |object| match object {
                Object::List(items) => {
                    let len = items.len();
                    let resolved = if index < 0 {
                        usize::try_from(index.unsigned_abs())
                            .ok()
                            .and_then(|back| len.checked_sub(back))
                    } else {
                        usize::try_from(index).ok().filter(|i| *i < len)
                    };
                    resolved
                        .map(|i| items[i])
                        .ok_or(RuntimeError::IndexOutOfRange { index, len })
                }
                _ => Err(RuntimeError::NotAList(list)),
            })
            .ok_or(RuntimeError::UnknownIdentity(list))?
    }

    pub fn list_len(&self, list: Word) -> RuntimeResult<usize> {
        self.expect_list(list)?;
        self.heap
            .with_object(list, |object| match object {
                Object::List(items) => Ok(items.len()),
                _ => Err(RuntimeError::NotAList(list)),
            })
            .ok_or(RuntimeError::UnknownIdentity(list))?
    }

    /// Identity of `range[slice]`, packed when the result fits.
    pub fn range_slice(&self, range: Word, slice: &Slice) -> RuntimeResult<Word> {
        let Object::Range(range) = self.resolve(range)? else {
            return Err(RuntimeError::NotARange(range));
        };
        Ok(self.identity_of(Object::Range(range.slice(slice)?)))
    }

    fn expect_packed(&self, word: Word) -> RuntimeResult<()> {
        if word.is_packed() {
            Ok(())
        } else {
            Err(RuntimeError::InvalidTag(word))
        }
    }

    fn expect_list(&self, list: Word) -> RuntimeResult<()> {
        match self.heap.object_type(list) {
            Some(ObjectType::List) => Ok(()),
            Some(_) => Err(RuntimeError::NotAList(list)),
            None if list.is_heap() => Err(RuntimeError::UnknownIdentity(list)),
            None => Err(RuntimeError::NotAList(list)),
        }
    }

    fn checked(&self, result: RuntimeResult<()>) -> RuntimeResult<()> {
        match result {
            Err(err) if !self.mode.detects_errors() => {
                log::warn!("ignoring refcount error: {err}");
                Ok(())
            }
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ModeCreateInfo, Range};

    fn packed() -> Runtime {
        Runtime::new(Mode::packed().unwrap())
    }

    fn sentinel(error_detection: bool) -> Runtime {
        Runtime::new(
            Mode::new(ModeCreateInfo {
                packing: true,
                simulate_refcounts: false,
                error_detection,
            })
            .unwrap(),
        )
    }

    fn conventional() -> Runtime {
        Runtime::new(Mode::conventional())
    }

    #[test]
    fn packed_identities_are_computed() {
        let rt = packed();
        let a = rt.identity_of(Object::Int(40 * 300));
        let b = rt.identity_of(Object::Int(-600 * -20));
        assert_eq!(a, b);
        assert!(a.is_packed());
        assert_eq!(rt.refcount_of(a), Ok(2));
        assert!(rt.heap().is_empty());
    }

    #[test]
    fn unpackable_values_fall_back_to_the_heap() {
        let rt = packed();
        let big = rt.identity_of(Object::Int(1 << 40));
        assert!(big.is_heap());
        assert_eq!(rt.type_of(big), Some(ObjectType::Int));
        assert_eq!(rt.resolve(big), Ok(Object::Int(1 << 40)));
        assert_eq!(rt.refcount_of(big), Ok(1));
        assert_ne!(big, rt.identity_of(Object::Int(1 << 40)));
    }

    #[test]
    fn conventional_mode_shares_special_cells() {
        let rt = conventional();
        let a = rt.identity_of(Object::None);
        let b = rt.identity_of(Object::None);
        assert_eq!(a, b);
        assert!(a.is_heap());
        assert_eq!(rt.identity_of(Object::Int(256)), rt.identity_of(Object::Int(256)));
        assert_ne!(rt.identity_of(Object::Int(12000)), rt.identity_of(Object::Int(12000)));
        assert_eq!(rt.type_table(), None);
        assert!(rt.tag_constants().is_empty());
    }

    #[test]
    fn type_of_uses_the_table_for_packed_words() {
        let rt = packed();
        let word = rt.identity_of(Object::Bool(true));
        assert_eq!(rt.type_of(word), Some(ObjectType::Bool));
        assert_eq!(rt.type_of(Word::from_raw(0x08)), None);
        assert_eq!(rt.tag_constants().len(), 12);

        let rt = conventional();
        assert_eq!(rt.type_of(Word::make(Tag::Bool, 0)), None);
    }

    #[test]
    fn sentinel_counts_never_move() {
        let rt = sentinel(true);
        let word = rt.identity_of(Object::Float(567.8));
        assert_eq!(rt.refcount_of(word), Ok(DUMMY_REFCNT));
        rt.retain(word).unwrap();
        rt.release(word).unwrap();
        rt.release(word).unwrap();
        assert_eq!(rt.refcount_of(word), Ok(DUMMY_REFCNT));
    }

    #[test]
    fn errors_are_detected_or_ignored() {
        let rt = packed();
        let word = rt.identity_of(Object::Int(3));
        rt.release(word).unwrap();
        assert_eq!(rt.release(word), Err(RuntimeError::RefcountUnderflow(word)));
        let bogus = Word::from_raw(0x1008);
        assert_eq!(rt.retain(bogus), Err(RuntimeError::InvalidTag(bogus)));
        let gone = Word::from_address(0x20);
        assert_eq!(rt.release(gone), Err(RuntimeError::UnknownIdentity(gone)));

        let mode = Mode::new(ModeCreateInfo {
            packing: true,
            simulate_refcounts: true,
            error_detection: false,
        })
        .unwrap();
        let rt = Runtime::new(mode);
        let word = rt.identity_of(Object::Int(3));
        rt.release(word).unwrap();
        assert_eq!(rt.release(word), Ok(()));
        assert_eq!(rt.retain(bogus), Ok(()));
        assert_eq!(rt.refcount_of(word), Ok(0));
    }

    #[test]
    fn lists_own_their_items() {
        let rt = conventional();
        let list = rt.new_list();
        let item = rt.identity_of(Object::Str("spam".into()));
        rt.list_append(list, item).unwrap();
        assert_eq!(rt.refcount_of(item), Ok(2));
        assert_eq!(rt.list_len(list), Ok(1));
        assert_eq!(rt.list_get(list, -1), Ok(item));
        assert_eq!(
            rt.list_get(list, 1),
            Err(RuntimeError::IndexOutOfRange { index: 1, len: 1 })
        );

        rt.release(item).unwrap();
        rt.release(list).unwrap();
        assert!(!rt.heap().contains(item));
        assert!(!rt.heap().contains(list));
    }

    #[test]
    fn appending_to_a_non_list_fails() {
        let rt = packed();
        let not_list = rt.identity_of(Object::Str("spam".into()));
        let item = rt.identity_of(Object::Int(1));
        assert_eq!(
            rt.list_append(not_list, item),
            Err(RuntimeError::NotAList(not_list))
        );
        assert_eq!(rt.list_len(item), Err(RuntimeError::NotAList(item)));
        assert_eq!(rt.refcount_of(item), Ok(1));
    }

    #[test]
    fn range_slices_intern_when_packed() {
        let rt = packed();
        let r1 = rt.identity_of(Object::Range(Range::new(0, 300, 4).unwrap()));
        let r2 = rt.identity_of(Object::Range(Range::new(0, 600, 2).unwrap()));
        let a = rt.range_slice(r1, &Slice::new(None, None, Some(3))).unwrap();
        let b = rt.range_slice(r2, &Slice::new(None, Some(150), Some(6))).unwrap();
        assert_eq!(a, b);
        assert!(a.is_packed());

        let rt = conventional();
        let r1 = rt.identity_of(Object::Range(Range::new(0, 300, 4).unwrap()));
        let r2 = rt.identity_of(Object::Range(Range::new(0, 600, 2).unwrap()));
        let a = rt.range_slice(r1, &Slice::new(None, None, Some(3))).unwrap();
        let b = rt.range_slice(r2, &Slice::new(None, Some(150), Some(6))).unwrap();
        assert_ne!(a, b);
        assert_eq!(rt.resolve(a), rt.resolve(b));

        let s = rt.identity_of(Object::Str("spam".into()));
        assert_eq!(
            rt.range_slice(s, &Slice::default()),
            Err(RuntimeError::NotARange(s))
        );
    }

    #[test]
    fn released_packed_values_leave_no_counters() {
        let rt = packed();
        for n in 0..10_000 {
            let word = rt.identity_of(Object::Int(n));
            rt.release(word).unwrap();
            assert_eq!(rt.refcount_of(word), Ok(0));
        }
        assert_eq!(rt.counts.tracked(), 0);
    }

    #[test]
    fn freeing_a_list_releases_every_item_past_a_bad_one() {
        let rt = conventional();
        let list = rt.new_list();
        let good = rt.identity_of(Object::Str("good".into()));
        let dangling = rt.identity_of(Object::Str("dangling".into()));
        rt.list_append(list, good).unwrap();
        rt.list_append(list, dangling).unwrap();
        rt.release(good).unwrap();
        rt.release(dangling).unwrap();
        rt.release(dangling).unwrap();
        assert!(!rt.heap().contains(dangling));

        // dangling is popped first and fails, good must still be freed
        assert_eq!(rt.release(list), Err(RuntimeError::UnknownIdentity(dangling)));
        assert!(!rt.heap().contains(good));
        assert!(!rt.heap().contains(list));
    }

    #[test]
    fn lists_given_by_value_retain_their_items() {
        let rt = packed();
        let item = rt.identity_of(Object::Int(1234));
        let text = rt.identity_of(Object::Str("spam".into()));
        let list = rt.identity_of(Object::List(vec![item, text]));
        assert_eq!(rt.refcount_of(item), Ok(2));
        assert_eq!(rt.refcount_of(text), Ok(2));
        assert_eq!(rt.list_len(list), Ok(2));

        rt.release(list).unwrap();
        assert_eq!(rt.refcount_of(item), Ok(1));
        assert_eq!(rt.refcount_of(text), Ok(1));
    }
}
