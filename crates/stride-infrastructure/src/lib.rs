//! Storage implementations for the Stride client's persistent key-value
//! capability.

pub mod json_file;
pub mod memory;
pub mod paths;

pub use json_file::JsonFileKvStore;
pub use memory::MemoryKvStore;
pub use paths::StridePaths;
