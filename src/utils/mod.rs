//! Small shared helpers.

mod collections;
mod id_generator;

pub use collections::new_field_map;
pub use id_generator::IdGenerator;
