pub mod fields;
pub mod html;

pub use fields::{extract_fields, LabelCell, TableRow};
