//! Startup configuration from environment variables.

use std::time::Duration;

use thiserror::Error;

use erplink_rpc::ConnectionParams;

pub const URL_VAR: &str = "ERPLINK_URL";
pub const DB_VAR: &str = "ERPLINK_DB";
pub const USERNAME_VAR: &str = "ERPLINK_USERNAME";
pub const PASSWORD_VAR: &str = "ERPLINK_PASSWORD";
pub const TIMEOUT_VAR: &str = "ERPLINK_TIMEOUT_SECS";
pub const PRODUCT_NAME_VAR: &str = "ERPLINK_PRODUCT_NAME";
pub const PRODUCT_CODE_VAR: &str = "ERPLINK_PRODUCT_CODE";
pub const SALES_PRICE_VAR: &str = "ERPLINK_SALES_PRICE";
pub const COST_PRICE_VAR: &str = "ERPLINK_COST_PRICE";
pub const STOCK_QUANTITY_VAR: &str = "ERPLINK_STOCK_QUANTITY";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Defaults offered at the product and stock prompts.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDefaults {
    pub name: String,
    pub code: String,
    pub sales_price: f64,
    pub cost_price: f64,
    pub stock_quantity: f64,
}

impl Default for ProductDefaults {
    fn default() -> Self {
        Self {
            name: "Premium Whiskey".into(),
            code: "WHISKY001".into(),
            sales_price: 45.99,
            cost_price: 30.00,
            stock_quantity: 10.0,
        }
    }
}

/// Everything read from the environment, once, at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub connection: ConnectionParams,
    pub defaults: ProductDefaults,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let timeout = match get(TIMEOUT_VAR) {
            None => DEFAULT_TIMEOUT_SECS,
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: TIMEOUT_VAR,
                        value,
                        reason: "expected a positive number of seconds",
                    });
                }
            },
        };

        let fallback = ProductDefaults::default();
        let price = |name: &'static str, default: f64| -> Result<f64, ConfigError> {
            match get(name) {
                None => Ok(default),
                Some(value) => match value.parse::<f64>() {
                    Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
                    _ => Err(ConfigError::Invalid {
                        var: name,
                        value,
                        reason: "expected a non-negative number",
                    }),
                },
            }
        };

        Ok(Self {
            connection: ConnectionParams {
                endpoint: required(URL_VAR)?,
                database: required(DB_VAR)?,
                username: required(USERNAME_VAR)?,
                secret: required(PASSWORD_VAR)?,
                timeout: Duration::from_secs(timeout),
            },
            defaults: ProductDefaults {
                name: get(PRODUCT_NAME_VAR).unwrap_or(fallback.name),
                code: get(PRODUCT_CODE_VAR).unwrap_or(fallback.code),
                sales_price: price(SALES_PRICE_VAR, fallback.sales_price)?,
                cost_price: price(COST_PRICE_VAR, fallback.cost_price)?,
                stock_quantity: price(STOCK_QUANTITY_VAR, fallback.stock_quantity)?,
            },
        })
    }
}
