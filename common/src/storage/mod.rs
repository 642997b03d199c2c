// Storage module for accumulation file backends

pub mod handler;
pub mod local_store;
pub mod object_store;

pub use handler::{AccumulationFileHandler, FileStore, FORCE_LOCAL_ENV, TEST_FIXTURE_FILENAME};
pub use local_store::LocalStore;
pub use object_store::ObjectStore;
