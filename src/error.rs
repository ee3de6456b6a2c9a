use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
	#[error("expected observable list as the first argument")]
	ExpectedObservableList,

	#[error("expected observable map as the first argument")]
	ExpectedObservableMap,

	#[error("index {index} is out of bounds for a list of length {len}")]
	IndexOutOfBounds { index: usize, len: usize },
}
