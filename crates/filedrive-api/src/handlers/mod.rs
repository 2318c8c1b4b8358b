pub mod auth;
pub mod files;
pub mod storage;
