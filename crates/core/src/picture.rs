//! Picture view: persons plus shared interaction objects.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::person::{Hoi, HoiObject, Person};
use crate::schema::PictureRecord;

pub struct Picture {
  image_path: String,
  pub persons: Vec<Person>,
  /// Indexed like the raw `objects` array; deleted slots stay `None` so
  /// person-side indices remain valid.
  pub hoi_objects: Vec<Option<Arc<HoiObject>>>,
}

impl Picture {
  pub fn from_record(record: PictureRecord) -> Picture {
    let hoi_objects: Vec<Option<Arc<HoiObject>>> = record
      .objects
      .iter()
      .map(|obj| {
        if obj.deleted {
          None
        } else {
          Some(Arc::new(HoiObject {
            name: obj.name.clone(),
            possible_names: obj.possible_names.clone(),
            bbox: obj.bbox,
          }))
        }
      })
      .collect();

    let mut persons: Vec<Person> = record
      .persons
      .into_iter()
      .filter(|p| !p.deleted)
      .map(|p| Person::new(p, &record.detect_results))
      .collect();
    for person in &mut persons {
      person.init_hois(&hoi_objects);
    }

    Picture {
      image_path: record.image_path,
      persons,
      hoi_objects,
    }
  }

  /// File name of the image, without any upstream directory prefix.
  pub fn image_file_name(&self) -> &str {
    self.image_path.rsplit('/').next().unwrap_or(&self.image_path)
  }

  /// The image resolved against the dataset directory.
  pub fn image_path(&self, dataset_dir: &Path) -> PathBuf {
    dataset_dir.join(self.image_file_name())
  }

  /// Every interaction of every person in the picture.
  pub fn full_hoi(&self) -> Vec<&Hoi> {
    self.persons.iter().flat_map(|p| p.hois.iter()).collect()
  }

  /// Names of all live interaction objects.
  pub fn object_names(&self) -> Vec<&str> {
    self
      .hoi_objects
      .iter()
      .flatten()
      .map(|obj| obj.name.as_str())
      .collect()
  }
}
