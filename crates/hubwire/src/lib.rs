//! Wire codec for a multi-server hub backplane.
//!
//! This crate re-exports [`hubwire_codec`] and ships the `hubwire` binary
//! (feature `cli`), which encodes, decodes and inspects backplane frames
//! without a broker.

pub use hubwire_codec::*;
