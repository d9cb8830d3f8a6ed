use crate::{Error, Result};
use flate2::read::GzDecoder;
use std::path::Path;
use tar::{Archive, EntryType};

/// Largest single file accepted from a release archive
const MAX_ENTRY_SIZE: u64 = 100 * 1024 * 1024;

/// Unpack a gzip-compressed tarball into `dest`.
///
/// Only regular files and directories are written; links and metadata
/// entries (such as GitHub's `pax_global_header`) are skipped. An entry whose
/// path would land outside `dest` fails the whole unpack.
pub fn unpack_tar_gz(bytes: &[u8], dest: &Path) -> Result<()> {
    let mut archive = Archive::new(GzDecoder::new(bytes));
    archive.set_preserve_permissions(false);
    archive.set_overwrite(true);

    std::fs::create_dir_all(dest)?;

    let entries = archive
        .entries()
        .map_err(|e| Error::Archive(format!("failed to read entries: {}", e)))?;

    let mut written = 0usize;
    for entry in entries {
        let mut entry = entry.map_err(|e| Error::Archive(format!("bad entry: {}", e)))?;

        let entry_type = entry.header().entry_type();
        if !matches!(entry_type, EntryType::Regular | EntryType::Directory) {
            continue;
        }

        if entry.size() > MAX_ENTRY_SIZE {
            return Err(Error::Archive(format!(
                "entry exceeds {} bytes",
                MAX_ENTRY_SIZE
            )));
        }

        let path = entry
            .path()
            .map_err(|e| Error::Archive(format!("bad entry path: {}", e)))?
            .into_owned();

        let inside = entry
            .unpack_in(dest)
            .map_err(|e| Error::Archive(format!("failed to unpack {}: {}", path.display(), e)))?;
        if !inside {
            return Err(Error::Archive(format!(
                "entry escapes the target directory: {}",
                path.display()
            )));
        }
        written += 1;
    }

    tracing::debug!("Unpacked {} entries into {}", written, dest.display());
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tar::{Builder, Header};

    /// In-memory tarball shaped like a GitHub source archive
    pub(crate) fn release_tarball(prefix: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        {
            let mut builder = Builder::new(&mut encoder);

            let mut pax = Header::new_ustar();
            pax.set_entry_type(EntryType::XGlobalHeader);
            pax.set_size(0);
            pax.set_cksum();
            builder
                .append_data(&mut pax, "pax_global_header", std::io::empty())
                .unwrap();

            for (name, data) in files {
                let mut header = Header::new_gnu();
                header.set_size(data.len() as u64);
                header.set_mode(0o644);
                header.set_cksum();
                builder
                    .append_data(&mut header, format!("{}/{}", prefix, name), *data)
                    .unwrap();
            }

            builder.finish().unwrap();
        }
        encoder.finish().unwrap()
    }

    #[test]
    fn test_unpack_release_tarball() {
        let bytes = release_tarball(
            "octo-ext-1a2b3c",
            &[
                ("manifest.json", br#"{"name":"Octo","version":"1.0","manifest_version":3}"#),
                ("src/background.js", b"console.log(1)"),
            ],
        );

        let tmp = tempfile::tempdir().unwrap();
        unpack_tar_gz(&bytes, tmp.path()).unwrap();

        let root = tmp.path().join("octo-ext-1a2b3c");
        assert!(root.join("manifest.json").is_file());
        assert_eq!(
            std::fs::read_to_string(root.join("src/background.js")).unwrap(),
            "console.log(1)"
        );
        assert!(!tmp.path().join("pax_global_header").exists());
    }

    #[test]
    fn test_escaping_entry_is_rejected() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        {
            let mut builder = Builder::new(&mut encoder);
            let data = b"evil";
            let mut header = Header::new_gnu();
            header.set_size(data.len() as u64);
            // bypass the builder's own path checks
            header.as_old_mut().name[..10].copy_from_slice(b"../evil.js");
            header.set_cksum();
            builder.append(&header, &data[..]).unwrap();
            builder.finish().unwrap();
        }
        let bytes = encoder.finish().unwrap();

        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("out");
        let err = unpack_tar_gz(&bytes, &dest).unwrap_err();

        assert!(matches!(err, Error::Archive(_)));
        assert!(!tmp.path().join("evil.js").exists());
    }

    #[test]
    fn test_garbage_is_not_an_archive() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(unpack_tar_gz(b"not a tarball", tmp.path()).is_err());
    }
}
