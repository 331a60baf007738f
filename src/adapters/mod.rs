//! Adapter implementations of the port traits.
//!
//! `live` talks to the real remote store over HTTP; `memory` keeps everything
//! in process and backs the tests and the snapshot-file backend.

pub mod live;
pub mod memory;
