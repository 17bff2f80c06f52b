pub mod errors;
pub mod db;
pub mod billing;
pub mod status;
pub mod hosting_plan;
pub mod order;
pub mod addon;
pub mod catalog_service;
pub mod server;
pub mod server_addon;
pub mod server_service;

#[cfg(test)]
mod tests;
