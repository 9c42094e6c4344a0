// User aggregate: entity, value objects and credential hashing

pub mod password;
#[allow(clippy::module_inception)]
pub mod user;
pub mod value_objects;

pub use user::User;
pub use value_objects::{Email, EmailError};
