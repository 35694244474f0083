//! The five resource parsers, plus the shared helpers they all use
//! (language-direction manifest lookup, glob-based asset discovery, and the
//! USFM rescue/conversion machinery the Scripture parser depends on).

pub mod commentary;
mod manifest;
pub mod notes;
pub mod questions;
pub mod scripture;
mod shared;
pub mod usfm;
pub mod words;

pub use manifest::{read_lang_direction, read_lang_name};
