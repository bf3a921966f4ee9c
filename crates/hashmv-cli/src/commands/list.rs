use anyhow::Result;
use hashmv_core::registry::DigestList;

use crate::exit_codes;

pub fn run() -> Result<u8> {
    let list = DigestList::enumerate();
    for spec in list.iter() {
        if spec.is_alias() {
            let canonical = list
                .iter()
                .find(|s| !s.is_alias() && s.kind() == spec.kind());
            match canonical {
                Some(c) => println!("{} (alias of {})", spec.name(), c.name()),
                None => println!("{}", spec.name()),
            }
        } else {
            println!("{}", spec.name());
        }
    }
    Ok(exit_codes::SUCCESS)
}
