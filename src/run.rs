use {
	crate::{
		config::Options,
		discover::discover,
		error::{ConversionFailed, Error},
		gate, image, OUTPUT_EXTENSION,
	},
	std::{
		fs,
		io::Write,
		path::{self, Path, PathBuf},
		time::{Duration, Instant},
	},
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
	pub found: usize,
	pub converted: usize,
	pub skipped: usize,
	pub failed: usize,
	/// Conversions a dry run would have done. Never counted as `converted`.
	pub previewed: usize,
	pub elapsed: Duration,
}

impl RunSummary {
	#[must_use]
	pub fn succeeded(&self) -> bool {
		self.failed == 0
	}
}

pub struct FileTask {
	pub source: PathBuf,
	pub destination: PathBuf,
}

#[derive(Debug)]
pub enum Outcome {
	Skipped,
	PreviewedOnly,
	Converted,
	Failed(ConversionFailed),
}

impl FileTask {
	#[must_use]
	pub fn new(source: PathBuf) -> Self {
		let destination = source.with_extension(OUTPUT_EXTENSION);
		Self { source, destination }
	}

	/// Runs the task to one of its terminal states. Dry runs never touch the filesystem.
	#[must_use]
	pub fn process(self, options: &Options) -> Outcome {
		let Self { source, destination } = self;
		match gate::shouldConvert(&source, &destination, options.force) {
			Err(err) => Outcome::Failed(ConversionFailed::Metadata(err)),
			Ok(false) => Outcome::Skipped,
			Ok(true) if options.dryRun => Outcome::PreviewedOnly,
			Ok(true) => match image::convert(&source, &destination, options.transparency) {
				Ok(()) => Outcome::Converted,
				Err(err) => Outcome::Failed(err),
			},
		}
	}
}

/// Converts everything under `options.dataDir`, writing progress lines to `out`.
/// Per-file failures are counted in the summary; only a missing root or an unusable
/// report stream end the run early.
pub fn run(options: &Options, out: &mut impl Write) -> Result<RunSummary, Error> {
	let root = fs::canonicalize(&options.dataDir).map_err(|err| {
		log::debug!("{}: {err}", options.dataDir.display());
		Error::DirectoryNotFound(path::absolute(&options.dataDir).unwrap_or_else(|_| options.dataDir.clone()))
	})?;
	let sources = discover(&root)?;

	writeln!(out, "PCX to PNG converter")?;
	writeln!(out, "====================")?;
	writeln!(out, "Data directory: {}", root.display())?;
	writeln!(out, "Transparency:   {}", if options.transparency { "index 0 -> alpha" } else { "disabled" })?;
	writeln!(out, "Force:          {}", options.force)?;
	writeln!(out, "Dry run:        {}", options.dryRun)?;
	writeln!(out)?;

	let total = sources.len();
	let mut summary = RunSummary { found: total, ..RunSummary::default() };
	writeln!(out, "Found {total} PCX files\n")?;
	if total == 0 {
		writeln!(out, "Nothing to convert.")?;
		return Ok(summary);
	}

	let startTime = Instant::now();
	for (i, source) in (1..).zip(sources) {
		let relative = relativeTo(&root, &source);
		match FileTask::new(source).process(options) {
			Outcome::Skipped => {
				log::debug!("{relative}: up to date");
				summary.skipped += 1;
			}
			Outcome::PreviewedOnly => {
				summary.previewed += 1;
				writeln!(out, "  [{i}/{total}] Would convert: {relative}")?;
			}
			Outcome::Converted => {
				summary.converted += 1;
				if summary.converted % options.progressEvery.get() == 0 || i == total {
					writeln!(out, "  [{i}/{total}] Converted: {relative}")?;
				}
			}
			Outcome::Failed(err) => {
				log::debug!("{relative}: {err:?}");
				summary.failed += 1;
				writeln!(out, "  [{i}/{total}] FAILED: {relative} -- {err}")?;
			}
		}
	}
	summary.elapsed = startTime.elapsed();

	writeln!(out)?;
	writeln!(out, "Done in {:.1}s", summary.elapsed.as_secs_f64())?;
	writeln!(out, "  Converted: {}", summary.converted)?;
	writeln!(out, "  Skipped:   {}", summary.skipped)?;
	writeln!(out, "  Failed:    {}", summary.failed)?;
	writeln!(out, "  Total:     {}", summary.found)?;
	if options.dryRun {
		writeln!(out, "  Would convert: {}", summary.previewed)?;
	}
	Ok(summary)
}

fn relativeTo(root: &Path, path: &Path) -> String {
	path.strip_prefix(root).unwrap_or(path).display().to_string()
}
