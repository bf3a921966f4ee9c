//! Unified exit codes for the hashmv CLI.
//!
//! Part of the public contract. `SUCCESS` and `FAILURE` cover the generic
//! cases; placement errors carry their own code via
//! `hashmv_core::HashmvError::exit_code` (2 unknown algorithm, 3 template
//! overflow or width, 4 source read, 5 staging write, 6 commit).

pub const SUCCESS: u8 = 0;
pub const FAILURE: u8 = 1;
