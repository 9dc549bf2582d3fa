use anyhow::Context;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = event_horizon::from_env().context("failed to start")?;
    app.run().context("event loop terminated with an error")?;

    log::info!("Exited cleanly");
    Ok(())
}
