//! Compass: a terminal client for the Compass knowledge journal API.
//!
//! The library holds everything below the command line: the HTTP
//! [`gateway`], the [`model`] records are normalized into, [`filter`]
//! composition, the generic list/detail [`view`] controller and its runtime,
//! plus [`config`] and the JSONL [`analytics`] logs. The `compass` binary in
//! `main.rs` drives it through [`cli`].

pub mod analytics;
pub mod cli;
pub mod config;
pub mod filter;
pub mod gateway;
pub mod model;
pub mod view;
