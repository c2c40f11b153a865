//! Tandem: a chat partner simulator for conversational behavior experiments.
//!
//! A participant chats with a simulated partner. The experimental condition
//! picks the partner's persona and how long (and how visibly) it "types"
//! before each reply. Replies come from a hosted language model; every turn is
//! appended to a CSV log for analysis.
//!
//! See `DESIGN.md` for the architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod credentials;
pub mod experiment;
pub mod logging;
pub mod providers;
pub mod session;
pub mod turn;
pub mod turn_log;
