//! Relaywatch command line entry point.

fn main() -> std::process::ExitCode {
	relaywatch::command::run()
}
