use anyhow::Context;
use tedit::config::{CliArgs, USAGE};
use tedit::{error, logging, App, TuiApplication};

fn main() -> anyhow::Result<()> {
    error::setup_panic_handler();

    let args = CliArgs::parse(std::env::args().skip(1)).context("invalid command line")?;
    if args.show_help {
        println!("{}", USAGE);
        return Ok(());
    }

    let options = args.resolve().context("failed to load configuration")?;
    if let Some(path) = logging::init(&options).context("failed to initialize logging")? {
        log::debug!("logging to {}", path.display());
    }

    let app = App::with_options(&options).context("failed to open initial file")?;
    let mut tui = TuiApplication::new(app);
    tui.run().context("terminal session failed")?;

    log::info!("tedit exited");
    Ok(())
}
