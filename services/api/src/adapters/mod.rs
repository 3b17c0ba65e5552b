pub mod catalog;
pub mod identity;
pub mod memory;
pub mod store;

pub use catalog::PgCatalog;
pub use identity::PgIdentity;
pub use memory::MemoryStore;
pub use store::PgStore;
