pub mod ddragon_client;
pub mod endpoint;
pub mod parsing;
pub mod rate_limit;
pub mod riot_api_client;
pub mod transport;
pub mod worker;
