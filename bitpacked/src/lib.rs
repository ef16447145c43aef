mod error;
pub mod heap;
pub mod mode;
mod object;
pub mod packers;
pub mod refcount;
mod runtime;
pub mod special;
mod table;
pub mod tag;

pub use error::{ConfigError, RuntimeError, RuntimeResult};
pub use heap::{Heap, Released};
pub use mode::{Mode, ModeCreateInfo, ModeFlags};
pub use object::*;
pub use packers::Packer;
pub use refcount::DUMMY_REFCNT;
pub use runtime::Runtime;
pub use table::{TABLE_SLOTS, TypeTable};
pub use tag::{Identity, Tag, Word};
