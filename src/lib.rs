pub mod analysis;
pub mod api;
pub mod config;
pub mod extract;
pub mod inference;
pub mod manager;
pub mod routing;
pub mod sentiment;
