use std::process::ExitCode;

fn main() -> ExitCode {
    match retail_insights::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
