use std::io::{self, Write};

use anyhow::Context;

use erplink_cli::{Settings, Shell};

fn main() -> anyhow::Result<()> {
    erplink_observability::init();

    let settings = Settings::from_env().context("invalid configuration")?;
    tracing::info!(connection = ?settings.connection, "starting");

    let session = erplink_rpc::connect(settings.connection.clone())
        .context("could not open a session with the ERP")?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", session.gateway().handle())?;

    Shell::new(&session, settings.defaults, io::stdin().lock(), stdout).run()?;
    Ok(())
}
