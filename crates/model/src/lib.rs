#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod error;
pub mod quiz;
pub mod raw;

pub use quiz::{QuestionKind, QuestionRecord};
pub use raw::{decode, validate, Answer, RawQuestion};
