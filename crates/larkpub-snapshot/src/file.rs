//! Pre-rendered PNG files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use larkpub_config::Region;
use larkpub_docx::{ImageSource, SourceError};
use tracing::debug;

use crate::error::RenderError;
use crate::png::{png_dimensions, validate_png};

/// Reads a PNG file per region.
#[derive(Debug, Clone)]
pub struct FileSource {
    files: BTreeMap<Region, PathBuf>,
    fallback: Option<PathBuf>,
}

impl FileSource {
    #[must_use]
    pub fn new(files: BTreeMap<Region, PathBuf>) -> Self {
        Self {
            files,
            fallback: None,
        }
    }

    /// Serve the same file for every region.
    #[must_use]
    pub fn fixed(path: impl Into<PathBuf>) -> Self {
        Self {
            files: BTreeMap::new(),
            fallback: Some(path.into()),
        }
    }

    /// Read and validate the image for `region`.
    ///
    /// # Errors
    ///
    /// Returns an error if no file is configured, it cannot be read, or it is
    /// not a PNG.
    pub fn load(&self, region: Region) -> Result<Vec<u8>, RenderError> {
        let path = self
            .files
            .get(&region)
            .or(self.fallback.as_ref())
            .ok_or(RenderError::MissingSource(region))?;

        let data = std::fs::read(path).map_err(|source| RenderError::Io {
            path: path.clone(),
            source,
        })?;
        validate_png(&data)?;

        debug!(
            %region,
            path = %path.display(),
            bytes = data.len(),
            dimensions = ?png_dimensions(&data),
            "Loaded report image"
        );
        Ok(data)
    }
}

impl ImageSource for FileSource {
    fn render(&self, region: Region) -> Result<Vec<u8>, SourceError> {
        Ok(self.load(region)?)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::png::sample_png;

    #[test]
    fn test_load_per_region() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.png");
        let regional = dir.path().join("sg.png");
        std::fs::write(&global, sample_png(100, 50)).unwrap();
        std::fs::write(&regional, sample_png(200, 80)).unwrap();
        let source = FileSource::new(BTreeMap::from([
            (Region::Global, global),
            (Region::Regional, regional),
        ]));

        assert_eq!(source.load(Region::Global).unwrap(), sample_png(100, 50));
        assert_eq!(source.load(Region::Regional).unwrap(), sample_png(200, 80));
    }

    #[test]
    fn test_fixed_serves_every_region() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.png");
        std::fs::write(&path, sample_png(10, 10)).unwrap();
        let source = FileSource::fixed(&path);

        assert_eq!(source.render(Region::Global).unwrap(), sample_png(10, 10));
        assert_eq!(source.render(Region::Regional).unwrap(), sample_png(10, 10));
    }

    #[test]
    fn test_missing_region() {
        let source = FileSource::new(BTreeMap::new());
        assert!(matches!(
            source.load(Region::Regional),
            Err(RenderError::MissingSource(Region::Regional))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let source = FileSource::fixed(dir.path().join("absent.png"));
        assert!(matches!(source.load(Region::Global), Err(RenderError::Io { .. })));
    }

    #[test]
    fn test_rejects_non_png() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.png");
        std::fs::write(&path, "<html></html>").unwrap();
        let source = FileSource::fixed(&path);

        let err = source.render(Region::Global).unwrap_err();
        assert_eq!(err.to_string(), "invalid PNG data");
    }
}
