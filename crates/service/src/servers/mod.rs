//! Server lifecycle: domain types, repository abstraction and the service on top.

pub mod domain;
pub mod repo;
pub mod repository;
pub mod service;

pub use domain::{RecentServer, ServerCreate, ServerDetail, ServerStats, ServerUpdate, UserServerStats};
pub use repository::ServerRepository;
pub use service::ServerService;
