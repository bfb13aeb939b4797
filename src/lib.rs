// src/lib.rs

pub mod application;
pub mod config;
pub mod dao;
pub mod db;
pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod repository;
pub mod seed;
pub mod test_utils;
pub mod viewmodel;
