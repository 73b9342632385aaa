// Collaborator boundaries the extraction pipeline depends on
pub mod ports;

pub use ports::{PageSource, RateStore};
