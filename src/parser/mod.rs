pub mod records;
pub mod sanitize;

pub use records::{extract, to_text, TestCaseField, TestCaseRecord};
pub use sanitize::sanitize;
