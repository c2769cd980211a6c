//! Session state core for the editor chat panel.
//!
//! The reducer in [`chat`] owns every state rule; [`bridge`] feeds it host
//! events and user intents from one queue, and [`reply`] produces assistant
//! replies off the writer's path.
#![deny(unsafe_code)]

/// Single-writer bridge between the host, the user and the reducer.
pub mod bridge;
/// Sessions, messages, views and the pure transition function.
pub mod chat;
pub mod reply;
/// Panel settings loaded through figment.
pub mod settings;
