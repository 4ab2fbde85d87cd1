use std::process::ExitCode;

fn main() -> ExitCode {
    tiendanube_cli::run()
}
