use anyhow::Context;
use stacks_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load STACKS settings")?;
    stacks_telemetry::init(&settings.telemetry)?;

    stacks_app::run(settings).await
}
