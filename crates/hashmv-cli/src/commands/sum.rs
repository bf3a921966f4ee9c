use std::fs::File;
use std::io::{self, Read};

use anyhow::Result;
use hashmv_core::registry::DigestList;

use crate::args::SumArgs;
use crate::exit_codes;

const CHUNK: usize = 64 * 1024;

pub fn run(args: &SumArgs) -> Result<u8> {
    let list = DigestList::enumerate();
    let name_width = list
        .computation_entries()
        .map(|s| s.name().len())
        .max()
        .unwrap_or(0);

    if args.files.is_empty() {
        let stdin = io::stdin();
        sum_reader(&list, name_width, &mut stdin.lock(), "-")?;
        return Ok(exit_codes::SUCCESS);
    }

    let mut failed = false;
    for path in &args.files {
        let shown = path.display().to_string();
        let mut file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("hashmv: failed to open '{shown}' for reading: {e}");
                failed = true;
                continue;
            }
        };
        if let Err(e) = sum_reader(&list, name_width, &mut file, &shown) {
            eprintln!("hashmv: reading '{shown}' failed: {e:#}");
            failed = true;
        }
    }
    Ok(if failed {
        exit_codes::FAILURE
    } else {
        exit_codes::SUCCESS
    })
}

/// One read pass, every catalogue algorithm updated per chunk, one output
/// line per algorithm.
fn sum_reader(
    list: &DigestList,
    name_width: usize,
    reader: &mut dyn Read,
    shown: &str,
) -> Result<()> {
    let mut pass = list.begin();
    let mut buf = vec![0u8; CHUNK];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        pass.update(&buf[..n]);
    }
    for output in pass.finish() {
        let label = format!("({})", output.name);
        println!(
            "{label:<pad$}{shown}  {digest}",
            pad = name_width + 4,
            digest = hex::encode(&output.bytes)
        );
    }
    Ok(())
}
