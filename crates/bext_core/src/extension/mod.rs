//! Bundle extension object model.
//!
//! The host ABI (vtables, raw pointers) lives in `bext_ffi`; this module
//! holds the safe Rust contract it forwards to.

pub mod capability;
pub mod engine;
pub mod message;
pub mod object;
