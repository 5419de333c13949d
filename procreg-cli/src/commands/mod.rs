pub mod complete;
pub mod list;
pub mod replay;
pub mod report;
pub mod summary;
