pub mod common;
pub mod export;
pub mod list;
pub mod show;
pub mod stats;
pub mod sync;
