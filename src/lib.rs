pub mod api;
pub mod app;
pub mod config;
pub mod debounce;
pub mod detail;
pub mod error;
pub mod images;
pub mod models;
pub mod pages;
pub mod recommend;
pub mod search;
pub mod session;
pub mod timeline;
pub mod view;
