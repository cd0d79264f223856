/// File read/write helpers.
pub mod file;
