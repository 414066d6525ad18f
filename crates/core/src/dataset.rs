//! Dataset loading: one annotation JSON per picture in a flat directory.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::picture::Picture;
use crate::schema::PictureRecord;

/// Load every `*.json` annotation file under `dir` into picture views.
/// Files that fail to parse are reported and skipped; the annotation store
/// routinely holds work-in-progress records.
pub fn load_dataset(dir: &Path) -> Result<Vec<Picture>> {
  if !dir.is_dir() {
    return Err(Error::Dataset(format!("not a directory: {}", dir.display())));
  }

  let mut entries: Vec<_> = std::fs::read_dir(dir)?
    .filter_map(|e| e.ok())
    .map(|e| e.path())
    .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
    .collect();
  entries.sort();

  let mut pictures = Vec::with_capacity(entries.len());
  for path in entries {
    let text = std::fs::read_to_string(&path)?;
    match serde_json::from_str::<PictureRecord>(&text) {
      Ok(record) => pictures.push(Picture::from_record(record)),
      Err(e) => warn!(path = %path.display(), err = %e, "Skipping unparseable annotation file"),
    }
  }
  debug!(count = pictures.len(), dir = %dir.display(), "Loaded dataset");
  Ok(pictures)
}
