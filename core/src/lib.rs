pub mod catalog;
pub mod db;
pub mod defaults;
pub mod models;
pub mod purchase;
pub mod service;
pub mod storage;
