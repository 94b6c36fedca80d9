use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::Level;

use pkgpost::archive::{EntryPathPolicy, ExtractOptions, extract_with};
use pkgpost::config::{
	CONFIG_FILE_NAME, LoadedSettings, ensure_working_dir, generate_init_template, load_settings,
	user_config_path,
};
use pkgpost::job::parse_job_file;
use pkgpost::patch::patch;
use pkgpost::queue::{InlineQueue, TaskQueue, TaskState};

#[derive(Parser)]
#[command(name = "pkgpost")]
#[command(
	author,
	version,
	about = "Post-process uploaded application packages: extract archives and patch files"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Create a template .pkgpost.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing .pkgpost.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,

	/// Use this settings file instead of discovering one
	#[arg(long = "config", global = true, value_name = "FILE")]
	config_file: Option<PathBuf>,

	/// Increase log verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
	/// Replace every literal occurrence of PATTERN in FILE
	Patch {
		file: PathBuf,
		pattern: String,
		replacement: String,
	},
	/// Extract a zip archive into a directory
	Extract {
		archive: PathBuf,
		target: PathBuf,

		/// Skip entries that would land outside TARGET instead of failing
		#[arg(long)]
		skip_unsafe: bool,
	},
	/// Run a package job described by a TOML file
	Run { job: PathBuf },
	/// Settings management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display the effective settings and where they came from
	Show,
	/// Check the settings file for errors without running anything
	Validate,
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	if cli.init {
		return handle_init(cli.force);
	}

	let config = cli.config_file.as_deref();

	match cli.command {
		Some(Commands::Patch {
			file,
			pattern,
			replacement,
		}) => handle_patch(&file, &pattern, &replacement),
		Some(Commands::Extract {
			archive,
			target,
			skip_unsafe,
		}) => handle_extract(&archive, &target, skip_unsafe),
		Some(Commands::Run { job }) => handle_run(&job, config),
		Some(Commands::Config { action }) => match action {
			ConfigAction::Show => handle_config_show(config),
			ConfigAction::Validate => handle_config_validate(config),
		},
		// Unreachable in practice due to arg_required_else_help
		None => Ok(ExitCode::SUCCESS),
	}
}

fn init_logging(verbose: u8) {
	let level = match verbose {
		0 => Level::WARN,
		1 => Level::INFO,
		2 => Level::DEBUG,
		_ => Level::TRACE,
	};

	tracing_subscriber::fmt()
		.with_max_level(level)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let config_path = PathBuf::from(CONFIG_FILE_NAME);

	if config_path.exists() && !force {
		anyhow::bail!("{CONFIG_FILE_NAME} already exists. Use --force to overwrite.");
	}

	std::fs::write(&config_path, generate_init_template())
		.with_context(|| format!("Failed to write {}", config_path.display()))?;

	println!("Created {CONFIG_FILE_NAME}");
	Ok(ExitCode::SUCCESS)
}

fn handle_patch(file: &Path, pattern: &str, replacement: &str) -> Result<ExitCode> {
	let report = patch(file, pattern, replacement)
		.with_context(|| format!("Failed to patch {}", file.display()))?;

	println!(
		"Patched {}: {} replacement(s) across {} line(s)",
		file.display(),
		report.replacements,
		report.lines
	);
	Ok(ExitCode::SUCCESS)
}

fn handle_extract(archive: &Path, target: &Path, skip_unsafe: bool) -> Result<ExitCode> {
	let options = ExtractOptions {
		entry_paths: if skip_unsafe {
			EntryPathPolicy::Skip
		} else {
			EntryPathPolicy::Reject
		},
	};

	let summary = extract_with(archive, target, &options)
		.with_context(|| format!("Failed to extract {}", archive.display()))?;

	println!(
		"Extracted {} file(s) and {} director(ies) into {}",
		summary.files,
		summary.directories,
		target.display()
	);
	for name in &summary.skipped {
		println!("  skipped unsafe entry: {name}");
	}
	Ok(ExitCode::SUCCESS)
}

fn load(config: Option<&Path>) -> Result<LoadedSettings> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	load_settings(&cwd, config).context("Failed to load settings")
}

fn handle_run(job_path: &Path, config: Option<&Path>) -> Result<ExitCode> {
	let loaded = load(config)?;
	ensure_working_dir(&loaded.settings.working_dir).context("Cannot start worker")?;

	let job = parse_job_file(job_path)
		.with_context(|| format!("Failed to load job {}", job_path.display()))?;

	let queue = InlineQueue::new(loaded.settings);
	let id = queue.submit(job).context("Job was rejected")?;

	match queue.forget(id) {
		Some(TaskState::Succeeded(report)) => {
			println!("Task {id}: succeeded");
			println!(
				"  extracted {} file(s), {} byte(s)",
				report.extraction.files, report.extraction.bytes
			);
			for (file, patched) in &report.patched_files {
				println!(
					"  patched {} ({} replacement(s))",
					file.display(),
					patched.replacements
				);
			}
			Ok(ExitCode::SUCCESS)
		}
		Some(TaskState::Failed(message)) => {
			eprintln!("Task {id}: failed: {message}");
			Ok(ExitCode::FAILURE)
		}
		Some(TaskState::Waiting) | None => {
			eprintln!("Task {id}: no result recorded");
			Ok(ExitCode::FAILURE)
		}
	}
}

fn handle_config_show(config: Option<&Path>) -> Result<ExitCode> {
	let loaded = load(config)?;

	match &loaded.path {
		Some(path) => println!("# Source: {}", path.display()),
		None => println!("# Source: built-in defaults"),
	}
	println!("working-dir = {:?}", loaded.settings.working_dir.display().to_string());
	println!("broker-url = {:?}", loaded.settings.broker_url);
	println!("force-ssl = {}", loaded.settings.force_ssl);
	println!();

	if let Ok(user_path) = user_config_path() {
		println!("User config path: {}", user_path.display());
		if user_path.exists() {
			println!("  (exists)");
		} else {
			println!("  (not found)");
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate(config: Option<&Path>) -> Result<ExitCode> {
	match load(config) {
		Ok(loaded) => {
			match loaded.path {
				Some(path) => println!("Settings are valid: {}", path.display()),
				None => println!("No settings file found; built-in defaults are valid."),
			}
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {e:#}");
			Ok(ExitCode::FAILURE)
		}
	}
}
