// Squadcast service: statistics API client, TTL cache and the HTTP API.

pub mod api;
pub mod cache;
pub mod stats;
