//! `tq parse <link>` – classify a link without touching the queue.

use anyhow::Result;
use tq_core::link::{parse_link, ParsedLink};

pub fn run_parse(link: &str) -> Result<()> {
    let parsed = parse_link(link)?;
    print!("{}", describe(&parsed));
    Ok(())
}

pub(crate) fn describe(parsed: &ParsedLink) -> String {
    format!(
        "service: {}\ntype:    {}\nid:      {}\n",
        parsed.service, parsed.link_type, parsed.id
    )
}
