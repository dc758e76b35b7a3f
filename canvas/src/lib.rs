//! Stroke capture, vectorization and peer sync for the shared drawing canvas.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It turns
//! raw pointer motion into compact, scale-independent vector paths, streams
//! throttled previews of the stroke in progress, commits finished strokes and
//! reconciles the full drawing between peers for undo, clear and late
//! joiners. The host JavaScript layer only wires DOM events and the game's
//! messaging API to the session and carries out the returned
//! [`session::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | Top-level [`session::Engine`] and testable [`session::SessionCore`] |
//! | [`viewport`] | Device-pixel / logical coordinate conversion |
//! | [`stroke`] | Per-gesture point recorder and stroke size presets |
//! | [`path`] | Point sequence to SVG path data and back |
//! | [`preview`] | Preview cadence and remote preview playback |
//! | [`history`] | Committed-stroke log |
//! | [`message`] | Draw payloads exchanged between peers |
//! | [`render`] | Canvas2D painting of ink and overlay |
//! | [`consts`] | Shared numeric constants |

pub mod consts;
pub mod history;
pub mod message;
pub mod path;
pub mod preview;
pub mod render;
pub mod session;
pub mod stroke;
pub mod viewport;
