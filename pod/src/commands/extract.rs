use pod_format::Pod;

use crate::cli::ExtractArgs;
use crate::error::{Error, Result};

pub fn run(args: ExtractArgs) -> Result<()> {
    let pod = Pod::open(&args.archive).map_err(|source| Error::OpenArchive {
        path: args.archive.clone(),
        source,
    })?;

    let count = match &args.prefix {
        Some(prefix) => pod
            .extract_prefix(prefix, &args.output)
            .map_err(|source| Error::Extract { source })?,
        None => {
            pod.extract_all(&args.output)
                .map_err(|source| Error::Extract { source })?;
            pod.len()
        }
    };

    println!("Extracted {} entries to {}", count, args.output.display());
    Ok(())
}
