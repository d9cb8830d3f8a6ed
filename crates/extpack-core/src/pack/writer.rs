use super::schema;
use super::types::Pack;
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct PackWriter;

impl PackWriter {
    /// Validate and write a pack as indented JSON.
    ///
    /// Nothing is written when the pack is invalid.
    pub fn to_file(pack: &Pack, path: &Path) -> Result<()> {
        tracing::debug!("Writing pack file to: {}", path.display());

        schema::validate(pack).map_err(|violations| Error::InvalidPackFile { violations })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, pack)?;
        writer
            .write_all(b"\n")
            .and_then(|_| writer.flush())
            .map_err(|e| Error::io(path, e))?;

        tracing::info!(
            "Wrote pack '{}' with {} extension(s) to {}",
            pack.name,
            pack.extensions.len(),
            path.display()
        );

        Ok(())
    }

    /// Validate and convert a pack to an indented JSON string
    pub fn to_string(pack: &Pack) -> Result<String> {
        schema::validate(pack).map_err(|violations| Error::InvalidPackFile { violations })?;
        Ok(serde_json::to_string_pretty(pack)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::PackReader;
    use crate::pack::types::{Author, ExtensionDescriptor, ExtensionSource};

    fn sample_pack() -> Pack {
        Pack::new(
            "Research",
            "Reading helpers",
            Author::Name("sam".to_string()),
            vec![ExtensionDescriptor::new(
                "Reader",
                ExtensionSource::Local {
                    path: "/opt/reader".into(),
                },
            )],
        )
        .with_tags(["reading"])
    }

    #[test]
    fn test_pack_to_string() {
        let json = PackWriter::to_string(&sample_pack()).unwrap();
        assert!(json.contains("\"name\": \"Research\""));
        assert!(json.contains("\"type\": \"local\""));
    }

    #[test]
    fn test_write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("research.extpack");
        let pack = sample_pack();

        PackWriter::to_file(&pack, &path).unwrap();
        let loaded = PackReader::from_file(&path).unwrap();

        assert_eq!(loaded, pack);
    }

    #[test]
    fn test_invalid_pack_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.extpack");
        let pack = Pack::new("", "", Author::default(), vec![]);

        let err = PackWriter::to_file(&pack, &path).unwrap_err();
        assert!(matches!(err, Error::InvalidPackFile { .. }));
        assert!(!path.exists());
    }
}
