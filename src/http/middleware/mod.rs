//! Request middleware.

pub mod protection;

pub use protection::{protection_middleware, Protection};
