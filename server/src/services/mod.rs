//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own room access, the position protocol and persistence so
//! route handlers stay focused on protocol translation. Both the websocket
//! dispatcher and the REST handlers call the same entry points here.

pub mod chat;
pub mod persistence;
pub mod position;
pub mod room;
