pub mod repository;
pub mod sync_file;
pub mod traits;

pub use repository::{SelectorRepository, StoreFactory};
pub use sync_file::FileKvStore;
pub use traits::{KvBackend, MemoryKvStore, SelectorRecord, SelectorStore};
