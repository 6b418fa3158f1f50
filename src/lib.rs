// Allow dead code for items that are part of the public API but only used in tests
#![allow(dead_code)]

pub mod grammar;
pub mod input;
pub mod render;
pub mod scanner;
pub mod schema;
pub mod select;
