//! L1C archive unpacking.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{CatalogError, CatalogResult};

/// Unpack a downloaded L1C `.zip` archive into `dest` and return the path
/// of the extracted `.SAFE` directory.
pub fn unpack_product(zip_path: &Path, dest: &Path) -> CatalogResult<PathBuf> {
    let file = File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| CatalogError::Unpack(format!("{}: {e}", zip_path.display())))?;

    let mut safe_dir: Option<PathBuf> = None;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| CatalogError::Unpack(e.to_string()))?;

        // enclosed_name rejects entries that would escape the target dir
        let Some(rel_path) = entry.enclosed_name().map(Path::to_path_buf) else {
            return Err(CatalogError::Unpack(format!(
                "archive entry with unsafe path: {}",
                entry.name()
            )));
        };

        if let Some(root) = rel_path.components().next() {
            let root: &Path = root.as_ref();
            if root.extension().map_or(false, |ext| ext == "SAFE") {
                safe_dir.get_or_insert_with(|| dest.join(root));
            }
        }

        let out_path = dest.join(&rel_path);
        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
        } else {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&out_path)?;
            std::io::copy(&mut entry, &mut out)?;
        }
        debug!(entry = %rel_path.display(), "Extracted archive entry");
    }

    let safe_dir = safe_dir.ok_or_else(|| {
        CatalogError::Unpack(format!(
            "{}: no .SAFE directory in archive",
            zip_path.display()
        ))
    })?;

    info!(path = %safe_dir.display(), "Unpacked L1C product");
    Ok(safe_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn make_archive(dir: &Path, entries: &[(&str, &str)]) -> PathBuf {
        let zip_path = dir.join("product.zip");
        let file = File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, content) in entries {
            writer
                .start_file(*name, FileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        zip_path
    }

    #[test]
    fn test_unpack_finds_safe_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let zip_path = make_archive(
            tmp.path(),
            &[
                ("S2A_TEST.SAFE/MTD_MSIL1C.xml", "<xml/>"),
                ("S2A_TEST.SAFE/GRANULE/data.bin", "bytes"),
            ],
        );

        let out = tmp.path().join("ac");
        std::fs::create_dir_all(&out).unwrap();
        let safe = unpack_product(&zip_path, &out).unwrap();

        assert_eq!(safe, out.join("S2A_TEST.SAFE"));
        assert!(out.join("S2A_TEST.SAFE/MTD_MSIL1C.xml").is_file());
        assert!(out.join("S2A_TEST.SAFE/GRANULE/data.bin").is_file());
    }

    #[test]
    fn test_unpack_without_safe_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let zip_path = make_archive(tmp.path(), &[("readme.txt", "hi")]);

        let out = tmp.path().join("ac");
        std::fs::create_dir_all(&out).unwrap();
        assert!(matches!(
            unpack_product(&zip_path, &out),
            Err(CatalogError::Unpack(_))
        ));
    }

    #[test]
    fn test_unpack_missing_archive() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(unpack_product(&tmp.path().join("nope.zip"), tmp.path()).is_err());
    }
}
