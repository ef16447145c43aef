//! Conventional allocation path: anything that does not pack lives in a cell here
//! and is identified by the cell's address.
use std::{
    collections::HashMap,
    mem,
    sync::atomic::{AtomicUsize, Ordering},
};

use parking_lot::{Mutex, RwLock};

use crate::{Object, ObjectType, RuntimeError, RuntimeResult, Word, tag::TAG_BITS};

pub const HEAP_ALIGN: usize = 1 << TAG_BITS;

/// A heap resident object. Aligned so its address never carries tag bits.
#[repr(C, align(32))]
#[derive(Debug)]
pub struct HeapCell {
    refcount: AtomicUsize,
    /// special objects are never freed
    immortal: bool,
    object: Mutex<Object>,
}

const _: () = assert!(mem::align_of::<HeapCell>() == HEAP_ALIGN);

/// Outcome of dropping one reference.
#[derive(Debug, PartialEq)]
pub enum Released {
    Alive(usize),
    /// last reference gone, the object is handed back so the caller can release
    /// what it owned
    Freed(Object),
}

#[derive(Debug, Default)]
pub struct Heap {
    cells: RwLock<HashMap<u64, Box<HeapCell>, ahash::RandomState>>,
}

impl HeapCell {
    fn new(object: Object, immortal: bool) -> Box<Self> {
        Box::new(Self {
            refcount: AtomicUsize::new(1),
            immortal,
            object: Mutex::new(object),
        })
    }

    fn address(&self) -> u64 {
        self as *const HeapCell as u64
    }
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// New object with a single reference owned by the caller.
    pub fn allocate(&self, object: Object) -> Word {
        self.insert(HeapCell::new(object, false))
    }

    pub fn allocate_immortal(&self, object: Object) -> Word {
        self.insert(HeapCell::new(object, true))
    }

    fn insert(&self, cell: Box<HeapCell>) -> Word {
        let address = cell.address();
        log::trace!(
            "heap: allocated {} at 0x{address:x}",
            cell.object.lock().object_type()
        );
        self.cells.write().insert(address, cell);
        Word::from_address(address)
    }

    pub fn contains(&self, word: Word) -> bool {
        self.cells.read().contains_key(&word.raw())
    }

    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn refcount(&self, word: Word) -> Option<usize> {
        self.cells
            .read()
            .get(&word.raw())
            .map(|cell| cell.refcount.load(Ordering::Acquire))
    }

    pub fn object_type(&self, word: Word) -> Option<ObjectType> {
        self.with_object(word, Object::object_type)
    }

    pub fn with_object<R>(&self, word: Word, f: impl FnOnce(&Object) -> R) -> Option<R> {
        let cells = self.cells.read();
        let cell = cells.get(&word.raw())?;
        let object = cell.object.lock();
        Some(f(&object))
    }

    pub fn with_object_mut<R>(&self, word: Word, f: impl FnOnce(&mut Object) -> R) -> Option<R> {
        let cells = self.cells.read();
        let cell = cells.get(&word.raw())?;
        let mut object = cell.object.lock();
        Some(f(&mut object))
    }

    pub fn retain(&self, word: Word) -> RuntimeResult<usize> {
        let cells = self.cells.read();
        let cell = cells
            .get(&word.raw())
            .ok_or(RuntimeError::UnknownIdentity(word))?;
        Ok(cell.refcount.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Drop one reference, freeing the cell when it was the last one.
    ///
    /// Immortal cells refuse to go below one.
    pub fn release(&self, word: Word) -> RuntimeResult<Released> {
        {
            let cells = self.cells.read();
            let cell = cells
                .get(&word.raw())
                .ok_or(RuntimeError::UnknownIdentity(word))?;
            let floor = if cell.immortal { 1 } else { 0 };
            let previous = cell
                .refcount
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                    (count > floor).then(|| count - 1)
                })
                .map_err(|_| RuntimeError::RefcountUnderflow(word))?;
            if previous > 1 {
                return Ok(Released::Alive(previous - 1));
            }
        }

        let mut cells = self.cells.write();
        match cells.get(&word.raw()) {
            Some(cell) if cell.refcount.load(Ordering::Acquire) == 0 => {}
            Some(cell) => return Ok(Released::Alive(cell.refcount.load(Ordering::Acquire))),
            None => return Err(RuntimeError::UnknownIdentity(word)),
        }
        let cell = cells
            .remove(&word.raw())
            .ok_or(RuntimeError::UnknownIdentity(word))?;
        log::trace!("heap: freed {word}");
        Ok(Released::Freed(cell.object.into_inner()))
    }
}
