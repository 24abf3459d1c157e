pub mod compat;
pub mod form;
pub mod options;
pub mod queries;
pub mod types;

pub use compat::compatible_types;
pub use form::{DeptForm, FieldForm, normalize};
pub use queries::*;
pub use types::*;
