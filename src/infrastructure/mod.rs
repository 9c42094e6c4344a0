// Infrastructure layer module
// Database adapters behind the domain ports

pub mod database;
pub mod repositories;
