//! Interactive CLI chat experience.
//!
//! Implements the full conversation loop: async readline input, slash
//! commands, thinking spinners, markdown rendering of replies, and
//! lazy session creation. Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
