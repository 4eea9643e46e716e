//! Demo configuration, read from the environment.

use anyhow::{Context, bail};

use storefront_core::TenantId;

pub const TENANT_ID_VAR: &str = "STOREFRONT_TENANT_ID";
pub const OPEN_CART_VAR: &str = "STOREFRONT_OPEN_CART";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    /// Store the demo session shops in.
    pub tenant_id: TenantId,
    /// Leave the cart panel open at the end of the run.
    pub open_cart: bool,
}

impl DemoConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let tenant_id = match lookup(TENANT_ID_VAR) {
            Some(raw) => raw
                .parse::<TenantId>()
                .with_context(|| format!("{TENANT_ID_VAR} is not a valid tenant id"))?,
            None => {
                let generated = TenantId::new();
                tracing::warn!(%generated, "{TENANT_ID_VAR} not set; using a fresh tenant id");
                generated
            }
        };

        let open_cart = match lookup(OPEN_CART_VAR) {
            Some(raw) => parse_flag(&raw).with_context(|| format!("invalid {OPEN_CART_VAR}"))?,
            None => true,
        };

        Ok(Self {
            tenant_id,
            open_cart,
        })
    }
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected true/false, got '{other}'"),
    }
}
