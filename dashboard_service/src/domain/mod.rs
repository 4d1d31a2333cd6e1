pub mod error;
pub mod map;
pub mod models;
pub mod ports;
pub mod service;
pub mod view;
pub mod visibility;
