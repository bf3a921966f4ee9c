mod line;
mod list;
mod place;
mod sum;

use anyhow::Result;
use hashmv_core::HashmvError;

use crate::args::Command;

pub fn dispatch(cmd: Command) -> Result<u8> {
    match cmd {
        Command::Place(args) => place::run(&args),
        Command::Sum(args) => sum::run(&args),
        Command::Line(args) => line::run(&args),
        Command::List => list::run(),
    }
}

/// Map an error chain to the contract exit code. Core errors carry their
/// own; everything else is the generic failure.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<HashmvError>() {
        Some(core) => u8::try_from(core.exit_code()).unwrap_or(crate::exit_codes::FAILURE),
        None => crate::exit_codes::FAILURE,
    }
}
