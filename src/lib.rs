pub mod config;
pub mod credentials;
pub mod duration;
pub mod models;
pub mod sync;
