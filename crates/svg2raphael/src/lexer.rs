//! Byte-level scanning shared by the XML reader

pub mod cursor;

pub use cursor::Cursor;
