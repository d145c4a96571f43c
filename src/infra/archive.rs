use crate::error::{Result, RouteError};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::{debug, info};
use zip::ZipArchive;

/// Extract every entry of a zip archive below `destination`, replacing
/// files that already exist. Entries escaping the destination are refused.
pub fn unpack(archive_path: &Path, destination: &Path) -> Result<usize> {
    let file = File::open(archive_path).map_err(|_| RouteError::MissingFile {
        path: archive_path.to_path_buf(),
    })?;
    let mut archive = ZipArchive::new(file)?;

    let mut extracted = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = entry.enclosed_name().ok_or_else(|| RouteError::Api {
            message: format!("archive entry '{}' escapes the data directory", entry.name()),
        })?;
        let out_path = destination.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        debug!("extracted {}", out_path.display());
        extracted += 1;
    }

    info!(
        "unpacked {} files from {} into {}",
        extracted,
        archive_path.display(),
        destination.display()
    );
    Ok(extracted)
}
