use humansize::{FormatSize, BINARY};
use pod_format::{Payload, Pod};
use serde::Serialize;

use crate::cli::ListArgs;
use crate::error::{Error, Result};

#[derive(Serialize)]
struct JsonEntry {
    name: String,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<u64>,
}

pub fn run(args: ListArgs) -> Result<()> {
    let pod = Pod::open(&args.archive).map_err(|source| Error::OpenArchive {
        path: args.archive.clone(),
        source,
    })?;

    if args.json {
        list_json(&pod)
    } else {
        list_table(&pod)
    }
}

fn list_table(pod: &Pod) -> Result<()> {
    println!("{:>12}  Name", "Size");
    println!("{}", "-".repeat(60));

    let mut total = 0u64;
    for entry in pod.entries() {
        let size = entry.payload().len().unwrap_or(0);
        total += size;
        println!("{:>12}  {}", size.format_size(BINARY), entry.name());
    }

    println!("{}", "-".repeat(60));
    println!(
        "{:>12}  Total ({} entries)",
        total.format_size(BINARY),
        pod.len()
    );
    Ok(())
}

fn list_json(pod: &Pod) -> Result<()> {
    let entries: Vec<JsonEntry> = pod
        .entries()
        .iter()
        .map(|entry| JsonEntry {
            name: entry.name().to_string(),
            size: entry.payload().len().unwrap_or(0),
            offset: match entry.payload() {
                Payload::Stored { offset, .. } => Some(offset.get()),
                _ => None,
            },
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&entries).unwrap());
    Ok(())
}
