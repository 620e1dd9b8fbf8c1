pub mod api;
pub mod cart;
pub mod cli;
pub mod config;
pub mod database;
pub mod endpoints;
pub mod errors;
pub mod http;
pub mod pos;
pub mod routes;
pub mod threadpool;
pub mod views;
