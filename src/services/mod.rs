// Application services: business rules between the API and the repositories

pub mod user_service;

pub use user_service::{NewUser, ServiceError, ServiceResult, UserChanges, UserService};
