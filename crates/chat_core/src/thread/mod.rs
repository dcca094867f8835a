//! Thread module - derived branch trees

mod tree;

pub use tree::{BranchView, ResponseView, Thread, ROOT_THREAD_LEVEL};
