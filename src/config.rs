use {
	crate::error::{ConfigError, Error},
	serde::Deserialize,
	std::{fs, num::NonZeroUsize, path::PathBuf},
};

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_PROGRESS_EVERY: NonZeroUsize = match NonZeroUsize::new(50) {
	Some(every) => every,
	None => unreachable!(),
};

/// Contents of an optional `--config` TOML file. Every key may be left out.
#[derive(Deserialize, Default, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
	pub dataDir: Option<PathBuf>,
	pub transparency: Option<bool>,
	pub force: Option<bool>,
	pub dryRun: Option<bool>,
	pub progressEvery: Option<NonZeroUsize>,
}

impl FileConfig {
	pub fn load(path: PathBuf) -> Result<Self, Error> {
		let parsed = fs::read_to_string(&path)
			.map_err(ConfigError::from)
			.and_then(|text| toml::from_str(&text).map_err(ConfigError::from));
		parsed.map_err(|source| Error::Config { path, source })
	}
}

/// What the command line asked for. `None` means "not given".
#[derive(Default, Debug)]
pub struct Overrides {
	pub dataDir: Option<PathBuf>,
	pub transparency: Option<bool>,
	pub force: Option<bool>,
	pub dryRun: Option<bool>,
	pub progressEvery: Option<NonZeroUsize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
	pub dataDir: PathBuf,
	pub transparency: bool,
	pub force: bool,
	pub dryRun: bool,
	pub progressEvery: NonZeroUsize,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			dataDir: PathBuf::from(DEFAULT_DATA_DIR),
			transparency: true,
			force: false,
			dryRun: false,
			progressEvery: DEFAULT_PROGRESS_EVERY,
		}
	}
}

impl Options {
	/// Command line first, then the config file, then the built-in defaults.
	#[must_use]
	pub fn resolve(overrides: Overrides, file: FileConfig) -> Self {
		let default = Self::default();
		Self {
			dataDir: overrides.dataDir.or(file.dataDir).unwrap_or(default.dataDir),
			transparency: overrides.transparency.or(file.transparency).unwrap_or(default.transparency),
			force: overrides.force.or(file.force).unwrap_or(default.force),
			dryRun: overrides.dryRun.or(file.dryRun).unwrap_or(default.dryRun),
			progressEvery: overrides.progressEvery.or(file.progressEvery).unwrap_or(default.progressEvery),
		}
	}
}
