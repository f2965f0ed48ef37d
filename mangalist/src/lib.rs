//! mangalist library
//!
//! This library exposes the view engine, mutation dispatcher and
//! collection backends behind the `mangalist` command line tool.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod remote;
pub mod services;
