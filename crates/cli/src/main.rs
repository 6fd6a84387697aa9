use std::process::ExitCode;

fn main() -> ExitCode {
    rosterly_cli::run()
}
