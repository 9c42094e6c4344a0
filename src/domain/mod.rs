// Domain layer module exports
// Independent of HTTP and SQL concerns; storage is reached through ports

pub mod repositories;
pub mod user;
