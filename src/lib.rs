pub mod aggregate;
pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod model;
pub mod render;
pub mod report;
pub mod tabs;
pub mod view;
