//! Library crate for pickem-back, exposing the scoring engine, storage backends and
//! HTTP layers to the binaries and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod provider;
pub mod routes;
pub mod scoring;
pub mod services;
pub mod state;
