use std::path::Path;

use pod_format::{EntryPath, Pod};

use crate::cli::CreateArgs;
use crate::error::{Error, Result};

pub fn run(args: CreateArgs) -> Result<()> {
    if args.archive.exists() && !args.force {
        return Err(Error::ArchiveExists { path: args.archive });
    }

    let mut pod = Pod::new();

    for path in &args.paths {
        if path.is_dir() {
            add_dir(&mut pod, path)?;
        } else {
            add_file(&mut pod, path)?;
        }
    }

    pod.save(&args.archive).map_err(|source| Error::CreateArchive {
        path: args.archive.clone(),
        source,
    })?;

    println!("Created {} ({} entries)", args.archive.display(), pod.len());
    Ok(())
}

fn add_dir(pod: &mut Pod, dir: &Path) -> Result<()> {
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::ProcessDirEntry { source: e.into() })?;
        if !entry.file_type().is_file() {
            continue;
        }
        add_file(pod, entry.path())?;
    }
    Ok(())
}

fn add_file(pod: &mut Pod, path: &Path) -> Result<()> {
    // entry names are the sanitised given paths, so `pod create a.pod src/`
    // stores `src/...` entries
    let name = EntryPath::new(path).map_err(|source| Error::InvalidPath {
        path: path.to_path_buf(),
        source,
    })?;
    pod.add_file(name, path).map_err(|source| Error::AddFile {
        path: path.to_path_buf(),
        source,
    })
}
