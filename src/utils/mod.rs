//! Utils module - Funzioni di supporto per la manipolazione di stringhe

pub mod string_ext;

pub use string_ext::{EnumStr, LineEnding, StringError, StringExt, join_trimmed};
