// Repository implementations (data access layer)
// Adapters that implement the domain repository ports

pub mod postgres_user_repository;

pub use postgres_user_repository::PostgresUserRepository;
