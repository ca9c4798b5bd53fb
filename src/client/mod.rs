pub mod api;
pub mod assistant;
pub mod resource_client;
pub mod state;
