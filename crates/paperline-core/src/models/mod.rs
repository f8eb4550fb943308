pub mod metadata;
pub mod records;

pub use metadata::*;
pub use records::*;
