use std::io;

use anyhow::{Context, Result};
use hashmv_core::placement::{place, PlaceRequest, Source};
use hashmv_core::registry::DigestList;

use crate::args::PlaceArgs;
use crate::exit_codes;

pub fn run(args: &PlaceArgs) -> Result<u8> {
    let list = DigestList::single(&args.algorithm)?;
    let mode_mask = match &args.mode_mask {
        Some(raw) => Some(
            u32::from_str_radix(raw, 8)
                .with_context(|| format!("invalid octal mode mask '{raw}'"))?,
        ),
        None => None,
    };
    let request = PlaceRequest {
        pattern: &args.template,
        mode_mask,
    };

    let placement = match &args.from {
        Some(path) => place(&list, Source::Path(path), &request)?,
        None => {
            let stdin = io::stdin();
            let mut lock = stdin.lock();
            place(&list, Source::Stream(&mut lock), &request)?
        }
    };

    // the digest always goes to stdout as lowercase hex, whatever case the
    // template selected
    println!("{}", hex::encode(&placement.digests[0].bytes));
    tracing::info!(destination = %placement.destination.display(), "placed");
    Ok(exit_codes::SUCCESS)
}
