/// Minimal CSV record reader and writer.
pub mod csv;
/// Filesystem helpers: table files, caches, and directory walking.
pub mod fs;
