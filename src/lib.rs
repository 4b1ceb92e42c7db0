//! Caching client for the League of Legends APIs. All Riot API traffic is
//! funneled through one rate limit aware worker per client.

pub mod config;
pub mod model;
pub mod service;
