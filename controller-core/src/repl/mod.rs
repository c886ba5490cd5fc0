//! Console tooling shared between the emulator and host tests.
//!
//! The grammar lives in [`grammar`] and is implemented with a token/parse
//! pipeline that stays compatible with `no_std`.

pub mod catalog;
pub mod commands;
pub mod grammar;
pub mod status;
