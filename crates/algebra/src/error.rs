use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlgebraError {
  /// A person carried more than one observation for a single-valued slot.
  /// The upstream annotation is malformed; processing of that person must
  /// stop rather than silently pick one.
  #[error("duplicate {kind} observation '{name}' ({count} matches) on one person")]
  DataIntegrity {
    kind: &'static str,
    name: String,
    count: usize,
  },
}

pub type Result<T> = std::result::Result<T, AlgebraError>;
