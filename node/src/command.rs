use crate::bundle::{ComputedBundle, RunSignal};
use crate::cli::Cli;
use crate::pipeline::{run_once, RunError};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Parses the command line, runs the pipeline once and maps the outcome to an exit status.
pub fn run() -> ExitCode {
	let cli = Cli::parse();
	env_logger::Builder::new()
		.filter_level(cli.log_level)
		.format_timestamp_millis()
		.parse_default_env()
		.init();

	let result = execute(&cli);
	let signal = RunSignal::from_result(&result);
	match &signal {
		RunSignal::Success => log::info!("✅ Run complete"),
		RunSignal::Degraded { capabilities } => {
			for capability in capabilities {
				log::warn!(
					"⚠️ Run degraded: {} unavailable ({} feed: {})",
					capability.capability,
					capability.feed,
					capability.reason
				);
			}
		},
		RunSignal::Fatal { reason } => log::error!("❌ Run failed: {}", reason),
	}
	ExitCode::from(signal.exit_code())
}

fn execute(cli: &Cli) -> Result<ComputedBundle, RunError> {
	let config = cli.run_config()?;
	let runtime = tokio::runtime::Builder::new_multi_thread()
		.enable_all()
		.build()
		.map_err(RunError::Runtime)?;

	let bundle = runtime.block_on(run_once(config))?;
	write_bundle(&bundle, cli.output.as_deref())?;
	Ok(bundle)
}

/// Writes the bundle as pretty JSON to `output`, or to stdout when no path is given.
pub fn write_bundle(bundle: &ComputedBundle, output: Option<&Path>) -> Result<(), RunError> {
	let json = serde_json::to_string_pretty(bundle)?;
	match output {
		Some(path) => {
			std::fs::write(path, json)
				.map_err(|source| RunError::Output { path: path.to_path_buf(), source })?;
			log::info!("Bundle written to {}", path.display());
		},
		None => {
			let mut stdout = std::io::stdout().lock();
			writeln!(stdout, "{}", json)
				.map_err(|source| RunError::Output { path: PathBuf::from("-"), source })?;
		},
	}
	Ok(())
}
