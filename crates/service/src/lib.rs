//! Service layer providing the server lifecycle operations on top of `models`.
//! - Business rules live here; persistence sits behind [`servers::ServerRepository`].
//! - Reuses entity definitions and validation from the `models` crate.

pub mod errors;
pub mod servers;
#[cfg(test)]
pub mod test_support;

pub use errors::ServiceError;
pub use servers::ServerService;
