use {
	std::{io, path::PathBuf},
	thiserror::Error,
};

/// Errors that end the whole run before or between conversions.
#[derive(Debug, Error)]
pub enum Error {
	#[error("Data directory not found: {}", .0.display())]
	DirectoryNotFound(PathBuf),

	#[error("{}: {source}", .path.display())]
	Config { path: PathBuf, source: ConfigError },

	#[error("cannot write report: {0}")]
	Report(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error(transparent)]
	Read(#[from] io::Error),

	#[error(transparent)]
	Parse(#[from] toml::de::Error),
}

/// Why a single file could not be converted. Never aborts the run.
#[derive(Debug, Error)]
pub enum ConversionFailed {
	#[error("cannot read timestamps: {0}")]
	Metadata(#[source] io::Error),

	#[error("cannot decode PCX: {0}")]
	Decode(#[source] io::Error),

	#[error("image too large: {width}x{height}")]
	TooLarge { width: usize, height: usize },

	#[error("cannot create PNG: {0}")]
	Create(#[source] io::Error),

	#[error("cannot encode PNG: {0}")]
	Encode(#[from] png::EncodingError),
}
