use std::io::{self, Write};
use std::process::ExitCode;

use tracing::error;

use tofi::config::cli::{self, CliArgs};
use tofi::config::{self, Settings};
use tofi::logging;
use tofi::platform::TerminalSurface;
use tofi::render::text::select_backend;
use tofi::runtime::{Outcome, Session, Surface};

fn main() -> ExitCode {
    logging::init(logging::DEFAULT_DIRECTIVE);

    let args = match cli::parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(err) => err.exit(),
    };

    match run(&args) {
        Ok(Outcome::Selected(line)) => {
            let mut stdout = io::stdout().lock();
            match writeln!(stdout, "{line}").and_then(|()| stdout.flush()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    error!("failed to write selection: {err}");
                    ExitCode::FAILURE
                }
            }
        }
        Ok(Outcome::Cancelled) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> tofi::Result<Outcome> {
    let mut settings = Settings::default();
    config::load(&mut settings, args.config.as_deref())?;
    cli::apply_cli(&mut settings, args)?;

    let candidates = settings.source.load(io::stdin().lock())?;
    let backend = select_backend(&settings.style)?;

    let mut surface = TerminalSurface::open(&settings.layout, settings.hide_cursor)?;
    let mut session = Session::start(&settings, candidates, backend, &mut surface)?;
    let outcome = session.run(&mut surface)?;
    surface.stop()?;
    Ok(outcome)
}
