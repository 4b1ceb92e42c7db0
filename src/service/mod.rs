pub mod data_manager;
pub mod gameapi;
pub mod stats;
pub mod storage;
