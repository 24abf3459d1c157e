pub mod custom_field;
pub mod department;
pub mod field_value;
pub mod member;
pub mod preference;
pub mod ticket;
