// API layer module (HTTP adapters)
// Translates requests into service calls and service errors into statuses

pub mod errors;
pub mod handlers;
