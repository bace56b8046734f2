mod repository;

pub use repository::{Author, GitWorkingCopy};
