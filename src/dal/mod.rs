pub mod project_file;

pub use project_file::*;
