//! Folio: a portfolio editor client built on the `canvas` editing core.
//!
//! | Module | Role |
//! |---|---|
//! | [`config`] | Environment-driven client settings |
//! | [`session`] | Auth token and the backend profile |
//! | [`api`] | HTTP client for layout storage, AI helpers and chat |
//! | [`editor`] | An [`canvas::engine::EditorCore`] bound to the backend |

pub mod api;
pub mod config;
pub mod editor;
pub mod session;
