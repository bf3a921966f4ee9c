//! Digest-templated file naming with atomic placement.
//!
//! The crate names files after a cryptographic digest of their contents and
//! places them so that the destination path either does not exist or holds
//! the complete, correctly-named file — never a partial one. Four pieces:
//!
//! - [`bounded`]: fixed-capacity append primitives every path composition
//!   goes through; overflow is caught at the first append that would exceed
//!   the buffer.
//! - [`registry`]: the digest algorithm catalogue (alias folding, filters)
//!   and multi-algorithm single-pass hashing.
//! - [`template`]: expansion of `%`-directive patterns into concrete paths.
//! - [`placement`]: the two-phase expand-then-commit protocol over a rename
//!   or anonymous-staging target.

pub mod bounded;
pub mod errors;
pub mod placement;
pub mod registry;
pub mod template;

pub use bounded::BoundedCursor;
pub use errors::{HashmvError, Result};
pub use placement::{place, PlaceRequest, Placement, Source, DEST_MAX};
pub use registry::{AlgoKind, DigestList, DigestOutput, DigestSpec, MultiHasher};
