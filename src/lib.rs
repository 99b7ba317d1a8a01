pub mod cluster;
pub mod collect;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod http_client;
pub mod local_matches;
pub mod logging;
pub mod model;
pub mod report;
pub mod riot_api;
