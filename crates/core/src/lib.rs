pub mod config;
pub mod dataset;
pub mod error;
pub mod face_attrs;
pub mod geometry;
pub mod person;
pub mod picture;
pub mod schema;

pub use config::{BuilderConfig, Config, DatasetConfig, OracleConfig, OutputConfig, VocabConfig};
pub use dataset::load_dataset;
pub use error::{Error, Result};
pub use face_attrs::{FACE_ATTR_ADMIT, FACE_ATTR_DENY, FACE_ATTR_NAMES, admit_threshold, deny_threshold};
pub use geometry::BoundingBox;
pub use person::{Hoi, HoiObject, Person};
pub use picture::Picture;
pub use schema::{
  ClothingField, ClothingItem, DetectResults, FacexDetailing, HoiRecord, KeyPointGroups, ObjectRecord, PersonRecord,
  PictureRecord, QwenDetailing, Relationship,
};
