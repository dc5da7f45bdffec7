//! Nabtati library
//!
//! This library exposes the core functionality of the Nabtati plant tracker
//! for the server binary and for integration tests.

pub mod advice_proxy;
pub mod app;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod storage;
pub mod weather;
