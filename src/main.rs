use clap::Parser;
use mdpdf::config::{Args, INPUT_ENV};
use mdpdf::Conversion;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // log records from the library are bridged into tracing by `init`
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter())),
        )
        .with_writer(io::stderr)
        .init();

    let request = match args.into_request(std::env::var(INPUT_ENV).ok()) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    match mdpdf::convert(request).await {
        Ok(Conversion::Written { path, .. }) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Ok(Conversion::Preview(session)) => {
            eprintln!("Previewing {}. Press Enter to close.", session.document().display());
            match session.close_after_line(io::BufReader::new(io::stdin())).await {
                // end of input and read errors are logged by the session
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => fail(e),
            }
        }
        Err(e) => fail(e),
    }
}

fn fail(err: mdpdf::Error) -> ExitCode {
    eprintln!("error: {}", err);
    ExitCode::from(err.exit_code())
}
