mod as_the_crow_flies;
pub mod cache;
pub mod distance_provider;
pub mod distance_table;
pub mod distance_table_client;
pub mod osrm_api;
pub mod provider_error;
