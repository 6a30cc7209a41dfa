pub mod completions;
pub mod dump;
pub mod key;
pub mod tables;
