use anyhow::Context;

fn main() -> anyhow::Result<()> {
    storefront_observability::init();

    let config = storefront_demo::DemoConfig::from_env()?;
    tracing::info!(tenant_id = %config.tenant_id, "starting demo session");

    let summary = storefront_demo::run(&config)?;
    let json = serde_json::to_string(&summary).context("failed to encode cart summary")?;

    tracing::info!(
        item_count = summary.item_count,
        subtotal = summary.subtotal.minor_units(),
        summary = %json,
        "demo session finished"
    );

    Ok(())
}
