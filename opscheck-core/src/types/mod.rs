pub mod finding;
pub mod report;
pub mod result;
pub mod status;

pub use finding::ValueFinding;
pub use report::*;
pub use result::*;
pub use status::Status;
