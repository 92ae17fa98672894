#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

pub mod config;
pub mod error;
pub mod image;
pub mod run;

pub const PAL_ENTRIES: usize = 256;
pub const RGB_SIZE: usize = 3;
pub const RGBA_SIZE: usize = 4;
pub const PAL_LEN: usize = PAL_ENTRIES * RGB_SIZE;

/// Palette index that stands for "no pixel here" in the sprite sheets.
pub const FULLY_TRANSPARENT: u8 = 0;

pub const SOURCE_EXTENSION: &str = "pcx";
pub const OUTPUT_EXTENSION: &str = "png";

pub mod discover {
	use {
		crate::{error::Error, SOURCE_EXTENSION},
		std::{
			collections::HashSet,
			ffi::OsStr,
			fs,
			path::{Path, PathBuf},
		},
		walkdir::WalkDir,
	};

	/// Every `.pcx` file under `root`, lowercase-extension matches first, then the other
	/// spellings (`.PCX`, `.Pcx`, ...), each group sorted. Paths that resolve to the same file
	/// are reported once, at their first position.
	pub fn discover(root: &Path) -> Result<Vec<PathBuf>, Error> {
		if !root.is_dir() {
			return Err(Error::DirectoryNotFound(root.to_owned()));
		}
		let (mut lowercase, mut otherCase) = (Vec::<PathBuf>::new(), Vec::new());
		for entry in WalkDir::new(root) {
			let entry = match entry {
				Ok(entry) => entry,
				Err(err) => {
					log::warn!("skipping unreadable entry: {err}");
					continue;
				}
			};
			if entry.file_type().is_dir() {
				continue;
			}
			let group = match entry.path().extension().and_then(OsStr::to_str) {
				Some(SOURCE_EXTENSION) => &mut lowercase,
				Some(ext) if ext.eq_ignore_ascii_case(SOURCE_EXTENSION) => &mut otherCase,
				_ => continue,
			};
			group.push(entry.into_path());
		}
		lowercase.sort();
		otherCase.sort();
		let mut seen = HashSet::new();
		lowercase.append(&mut otherCase);
		lowercase.retain(|path| seen.insert(fs::canonicalize(path).unwrap_or_else(|_| path.clone())));
		Ok(lowercase)
	}
}

pub mod gate {
	use std::{fs, io, path::Path};

	/// Whether `source` needs (re)converting into `destination`: always with `force`,
	/// otherwise when the destination is missing or strictly older than the source.
	pub fn shouldConvert(source: &Path, destination: &Path, force: bool) -> io::Result<bool> {
		if force {
			return Ok(true);
		}
		let destinationModified = match fs::metadata(destination) {
			Ok(metadata) => metadata.modified()?,
			Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(true),
			Err(err) => return Err(err),
		};
		Ok(fs::metadata(source)?.modified()? > destinationModified)
	}
}

#[cfg(test)]
mod tests {
	use {
		super::{discover::discover, error::Error, gate::shouldConvert},
		filetime::{set_file_mtime, FileTime},
		std::fs,
		tempfile::TempDir,
	};

	#[test]
	fn discoverRejectsMissingRoot() {
		let dir = TempDir::new().unwrap();
		let missing = dir.path().join("nope");
		assert!(matches!(discover(&missing), Err(Error::DirectoryNotFound(path)) if path == missing));
	}

	#[test]
	fn discoverRejectsPlainFile() {
		let dir = TempDir::new().unwrap();
		let file = dir.path().join("a.pcx");
		fs::write(&file, b"").unwrap();
		assert!(matches!(discover(&file), Err(Error::DirectoryNotFound(_))));
	}

	#[test]
	fn discoverOrdersLowercaseBeforeOtherCase() {
		let dir = TempDir::new().unwrap();
		let root = dir.path();
		fs::create_dir_all(root.join("sub/deeper")).unwrap();
		fs::create_dir(root.join("folder.pcx")).unwrap();
		for name in ["b.pcx", "a.PCX", "sub/c.pcx", "sub/deeper/d.Pcx", "notes.txt", "a.png"] {
			fs::write(root.join(name), b"").unwrap();
		}
		let found = discover(root).unwrap();
		let names: Vec<_> =
			found.iter().map(|path| path.strip_prefix(root).unwrap().to_string_lossy().into_owned()).collect();
		assert_eq!(names, ["b.pcx", "sub/c.pcx", "a.PCX", "sub/deeper/d.Pcx"]);
	}

	#[cfg(target_os = "linux")]
	#[test]
	fn discoverReportsAliasedFileOnce() {
		let dir = TempDir::new().unwrap();
		let root = dir.path();
		fs::write(root.join("unit.pcx"), b"").unwrap();
		std::os::unix::fs::symlink(root.join("unit.pcx"), root.join("unit.PCX")).unwrap();
		assert_eq!(discover(root).unwrap(), [root.join("unit.pcx")]);
	}

	#[test]
	fn gateConvertsWhenDestinationMissing() {
		let dir = TempDir::new().unwrap();
		let source = dir.path().join("a.pcx");
		fs::write(&source, b"").unwrap();
		assert!(shouldConvert(&source, &dir.path().join("a.png"), false).unwrap());
	}

	#[test]
	fn gateComparesModificationTimesStrictly() {
		let dir = TempDir::new().unwrap();
		let (source, destination) = (dir.path().join("a.pcx"), dir.path().join("a.png"));
		fs::write(&source, b"").unwrap();
		fs::write(&destination, b"").unwrap();

		set_file_mtime(&source, FileTime::from_unix_time(1_000, 0)).unwrap();
		set_file_mtime(&destination, FileTime::from_unix_time(1_000, 0)).unwrap();
		assert!(!shouldConvert(&source, &destination, false).unwrap());
		assert!(shouldConvert(&source, &destination, true).unwrap());

		set_file_mtime(&source, FileTime::from_unix_time(2_000, 0)).unwrap();
		assert!(shouldConvert(&source, &destination, false).unwrap());

		set_file_mtime(&destination, FileTime::from_unix_time(3_000, 0)).unwrap();
		assert!(!shouldConvert(&source, &destination, false).unwrap());
	}

	#[test]
	fn forceSkipsMetadataEntirely() {
		let dir = TempDir::new().unwrap();
		let missing = dir.path().join("gone.pcx");
		assert!(shouldConvert(&missing, &dir.path().join("gone.png"), true).unwrap());
		assert!(shouldConvert(&missing, &dir.path().join("gone.png"), false).is_ok());
	}
}
