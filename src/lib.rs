//! Rewrite, expand and condense text through a hosted Dify app.
//!
//! The [`dify`] module holds the client. Its free functions
//! ([`dify::workflow_rewrite`], [`dify::chat_rewrite`], [`dify::optimize`],
//! [`dify::expand`], [`dify::contract`]) resolve configuration from the
//! environment and the local auth file, and always return a string: the
//! rewritten text or a description of what went wrong. Use
//! [`dify::DifyClient`] directly to get typed errors instead.

pub mod commands;
pub mod dify;
pub mod palette;
pub mod utils;
