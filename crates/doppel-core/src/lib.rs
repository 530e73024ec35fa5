//! Core business logic for Doppel.
//!
//! This crate defines the capability traits (text, live audio, media
//! generation, key/value persistence) and the engines that drive them:
//! conversational turns, live audio sessions, profile synthesis, task
//! extraction, decision simulation, and media jobs. Implementations of
//! the capability traits live in `doppel-infra`.

pub mod decision;
pub mod gateway;
pub mod live;
pub mod media;
pub mod profile;
pub mod session;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod translate;
pub mod turn;

#[cfg(test)]
pub(crate) mod testing;
