//! Client-side room engine: local view, drag sessions, click placement.
//!
//! The crate has no browser or network dependencies. A host (web shell or
//! the `roomctl` CLI) feeds it server snapshots and pointer events and
//! performs the [`engine::Action`]s it returns. Drag previews and click
//! placement run the same collision predicate the server uses, against the
//! last snapshot received; the server revalidates every submitted move.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::EngineCore`]: event handlers returning actions |
//! | [`view`] | Revision-checked local room copy and marker hit-testing |
//! | [`drag`] | Drag session state machine and click placement |
//! | [`input`] | Pointer buttons, UI state, gesture state |
//! | [`consts`] | Marker size and cursor names |

pub mod consts;
pub mod drag;
pub mod engine;
pub mod input;
pub mod view;
