//! Block model and direct-manipulation engine for the portfolio canvas editor.
//!
//! The crate holds no browser or network handles. It owns the scene of
//! positioned, styled blocks and the algorithms that select, move, resize,
//! rotate, reorder, duplicate and clipboard-copy them, with coordinate math that
//! stays correct under any zoom scale and inside nested sections. The host is
//! responsible only for wiring DOM events to [`engine::EditorCore`] and applying
//! the returned [`engine::Action`]s.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Editor core: events in, [`engine::Action`]s out |
//! | [`block`] | Block entity, per-variant styles/content, factory, patches |
//! | [`scene`] | Immutable, identity-preserving scene tree and its mutations |
//! | [`selection`] | Single selection and the block clipboard |
//! | [`keymap`] | Keyboard shortcuts with focus awareness |
//! | [`input`] | Input event types, pointer capture and the gesture state machine |
//! | [`hit`] | Hit-testing of block bodies and handles |
//! | [`geometry`] | Scale-aware translate / resize / rotate / drop math |
//! | [`viewport`] | Zoom, scroll and screen↔canvas conversion |
//! | [`render`] | Draw list with composed absolute geometry |
//! | [`consts`] | Shared numeric constants (size floor, offsets, zoom limits, handles) |

pub mod block;
pub mod consts;
pub mod engine;
pub mod geometry;
pub mod hit;
pub mod input;
pub mod keymap;
pub mod render;
pub mod scene;
pub mod selection;
pub mod viewport;
