use humansize::{FormatSize, BINARY};
use pod_build::config::ConfigFile;
use pod_build::{PathList, MANIFEST_ENTRY, PATH_FILE_ENTRY};
use pod_format::Pod;

use crate::cli::InfoArgs;
use crate::error::{Error, Result};

pub fn run(args: InfoArgs) -> Result<()> {
    let pod = Pod::open(&args.archive).map_err(|source| Error::OpenArchive {
        path: args.archive.clone(),
        source,
    })?;

    let total: u64 = pod
        .entries()
        .iter()
        .map(|e| e.payload().len().unwrap_or(0))
        .sum();

    println!("Archive:  {}", args.archive.display());
    println!("Version:  {}", pod.version());
    println!("Entries:  {}", pod.len());
    println!("Size:     {}", total.format_size(BINARY));

    if let Some(text) = read_text(&pod, MANIFEST_ENTRY)? {
        match ConfigFile::parse(&text) {
            Ok(manifest) => {
                println!();
                println!("Manifest:");
                for (key, value) in manifest.global().iter() {
                    println!("  {} = {}", key, value);
                }
                for (name, section) in manifest.sections() {
                    for (key, value) in section.iter() {
                        println!("  {}.{} = {}", name, key, value);
                    }
                }
            }
            Err(e) => tracing::warn!(entry = MANIFEST_ENTRY, error = %e, "unparseable manifest"),
        }
    }

    if let Some(text) = read_text(&pod, PATH_FILE_ENTRY)? {
        let list = PathList::parse(&text);
        println!();
        println!("Path file:");
        for (path, is_override) in list.entries() {
            println!("  {}{}", if is_override { "!" } else { "" }, path);
        }
    }

    Ok(())
}

fn read_text(pod: &Pod, name: &str) -> Result<Option<String>> {
    let Some(entry) = pod.entry(name) else {
        return Ok(None);
    };
    let bytes = pod.read_bytes(entry).map_err(|source| Error::ReadEntry {
        name: name.to_string(),
        source,
    })?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(Some(text)),
        Err(_) => {
            tracing::warn!(entry = name, "entry is not valid UTF-8");
            Ok(None)
        }
    }
}
