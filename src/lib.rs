pub mod api;
pub mod auth;
pub mod brewing;
pub mod config;
pub mod db;
pub mod rapt;
pub mod storage;
pub mod writer;
