//! Shared domain types for Doppel.
//!
//! This crate defines the data model of the digital-twin core: the user
//! profile, conversational sessions and messages, live voice transcripts,
//! decision records, gateway request/response shapes, supplemental state
//! domains (todos, points, gallery), configuration, and the error taxonomy.
//! It contains no I/O -- engines live in `doppel-core`, adapters in
//! `doppel-infra`.

pub mod config;
pub mod decision;
pub mod error;
pub mod gateway;
pub mod live;
pub mod profile;
pub mod session;
pub mod twin;
