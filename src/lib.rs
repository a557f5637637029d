pub mod api_client;
pub mod app;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod favorites;
pub mod feed;
pub mod loader;
pub mod profile;
pub mod search;
pub mod session;
pub mod storage;

#[cfg(test)]
mod test_support;
