pub mod resume;
pub mod section;

pub use resume::{Document, DocumentId};
pub use section::{SectionName, SectionValue};
