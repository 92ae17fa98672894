#![warn(clippy::pedantic, elided_lifetimes_in_paths, explicit_outlives_requirements)]
#![allow(non_snake_case)]

use {
	clap::Parser,
	pcx2png::{
		config::{FileConfig, Options, Overrides},
		error::Error,
		run::run,
	},
	std::{
		io::{self, Write},
		num::NonZeroUsize,
		path::PathBuf,
		process::ExitCode,
	},
};

/// Convert palette-indexed PCX files under a directory into PNG files.
#[derive(Parser, Debug)]
#[clap(version)]
struct Args {
	/// Root directory to scan for PCX files [default: data]
	#[clap(long = "data-dir", value_name = "PATH")]
	dataDir: Option<PathBuf>,
	/// Re-convert even if the PNG already exists and is newer
	#[clap(long, conflicts_with = "noForce")]
	force: bool,
	/// Respect timestamps even if the config file sets `force`
	#[clap(long = "no-force")]
	noForce: bool,
	/// Make palette index 0 transparent even if the config file disables it
	#[clap(long, conflicts_with = "noTransparency")]
	transparency: bool,
	/// Flatten the palette instead of making index 0 transparent
	#[clap(long = "no-transparency")]
	noTransparency: bool,
	/// List files that would be converted without writing anything
	#[clap(long = "dry-run", conflicts_with = "noDryRun")]
	dryRun: bool,
	/// Write output even if the config file sets `dryRun`
	#[clap(long = "no-dry-run")]
	noDryRun: bool,
	/// TOML file with defaults for the options above
	#[clap(long, value_name = "PATH")]
	config: Option<PathBuf>,
	/// Print a progress line after every N successful conversions [default: 50]
	#[clap(long = "progress-every", value_name = "N")]
	progressEvery: Option<NonZeroUsize>,
}

fn main() -> ExitCode {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
	let args = Args::parse();
	log::debug!("{args:?}");
	match convertAll(args) {
		Ok(true) => ExitCode::SUCCESS,
		Ok(false) => ExitCode::FAILURE,
		Err(err) => {
			eprintln!("ERROR: {err}");
			ExitCode::FAILURE
		}
	}
}

// `--x` gives Some(true), `--no-x` gives Some(false), neither leaves it to the config file.
fn switch(on: bool, off: bool) -> Option<bool> {
	(on || off).then_some(on)
}

fn convertAll(args: Args) -> Result<bool, Error> {
	let Args { dataDir, force, noForce, transparency, noTransparency, dryRun, noDryRun, config, progressEvery } =
		args;
	let file = match config {
		Some(path) => FileConfig::load(path)?,
		None => FileConfig::default(),
	};
	let overrides = Overrides {
		dataDir,
		transparency: switch(transparency, noTransparency),
		force: switch(force, noForce),
		dryRun: switch(dryRun, noDryRun),
		progressEvery,
	};
	let options = Options::resolve(overrides, file);
	let stdout = &mut io::stdout().lock();
	let summary = run(&options, stdout)?;
	stdout.flush()?;
	Ok(summary.succeeded())
}
