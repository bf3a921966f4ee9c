use std::io::{self, BufRead, Write};

use anyhow::Result;
use hashmv_core::registry::resolve_spec;

use crate::args::LineArgs;
use crate::exit_codes;

pub fn run(args: &LineArgs) -> Result<u8> {
    let spec = resolve_spec(&args.algorithm)?;
    let mut hasher = spec.kind().hasher();

    if let Some(text) = &args.text {
        hasher.update(text.as_bytes());
        println!("{}", hex::encode(hasher.finalize()));
        return Ok(exit_codes::SUCCESS);
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    // each line is hashed without its newline; one context, reset per line
    for line in stdin.lock().lines() {
        let line = line?;
        hasher.update(line.as_bytes());
        let digest = hasher.finalize_reset();
        writeln!(out, "{}\t{}", hex::encode(&digest), line)?;
    }
    Ok(exit_codes::SUCCESS)
}
