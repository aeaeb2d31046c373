//! # Register Configuration
//!
//! Pricing defaults a register starts every cart with.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     CLASP_TAX_RATE=8.25                                                 │
//! │     CLASP_FEE_HANDLING=absorb                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/clasp-pos/register.toml (Linux)                           │
//! │     ~/Library/Application Support/com.clasp.clasp-pos/register.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! │     no tax, no platform fee, fee passed to customer                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # register.toml
//! [register]
//! tenant_id = "00000000-0000-0000-0000-000000000001"
//! store_name = "Clasp Studio"
//!
//! [pricing]
//! tax_rate_bps = 825          # 8.25%
//! platform_fee_bps = 500      # 5%, omit for none
//! fee_handling = "pass_to_customer"   # or "absorb"
//!
//! [display]
//! currency_symbol = "$"
//! currency_decimals = 2
//!
//! [checkout]
//! require_component_setup = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::cart::Cart;
use crate::checkout::CheckoutPolicy;
use crate::error::{ConfigError, ConfigResult, ValidationError};
use crate::types::{FeeHandling, Rate};
use crate::validation::validate_rate;
use crate::DEFAULT_TENANT_ID;

/// File name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "register.toml";

// =============================================================================
// Sections
// =============================================================================

/// Which business and store this register belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterSection {
    pub tenant_id: String,
    pub store_name: String,
}

impl Default for RegisterSection {
    fn default() -> Self {
        Self {
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            store_name: "Clasp Studio".to_string(),
        }
    }
}

/// Rates every new cart starts with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingSection {
    pub tax_rate_bps: u32,
    /// `None` means no platform fee is charged.
    pub platform_fee_bps: Option<u32>,
    pub fee_handling: FeeHandling,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    pub currency_symbol: String,
    pub currency_decimals: u8,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutSection {
    /// Refuse commits while a line has no matching jump ring.
    pub require_component_setup: bool,
}

// =============================================================================
// Register Config
// =============================================================================

/// Complete register configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterConfig {
    pub register: RegisterSection,
    pub pricing: PricingSection,
    pub display: DisplaySection,
    pub checkout: CheckoutSection,
}

impl RegisterConfig {
    /// Loads from `config_path` (or the platform default), then environment.
    ///
    /// A missing file is not an error; defaults are used.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading register config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        info!(
            tenant_id = %config.register.tenant_id,
            tax_rate = %config.tax_rate(),
            fee_handling = %config.pricing.fee_handling,
            "Register config loaded"
        );
        Ok(config)
    }

    /// Like [`load`](Self::load), falling back to defaults on any error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load register config, using defaults");
            Self::default()
        })
    }

    /// Writes the config as pretty TOML, creating parent directories.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Register config saved");
        Ok(())
    }

    /// Checks rates and display settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.register.tenant_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "register.tenant_id".to_string(),
            }
            .into());
        }

        validate_rate("pricing.tax_rate_bps", self.tax_rate())?;
        if let Some(fee) = self.platform_fee_rate() {
            validate_rate("pricing.platform_fee_bps", fee)?;
        }

        if self.display.currency_decimals > 4 {
            return Err(ConfigError::Invalid(format!(
                "display.currency_decimals must be at most 4, got {}",
                self.display.currency_decimals
            )));
        }

        Ok(())
    }

    /// Applies `CLASP_*` variables from the process environment.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are logged
    /// and ignored.
    fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup("CLASP_TENANT_ID") {
            debug!(tenant_id = %id, "Overriding tenant ID from environment");
            self.register.tenant_id = id;
        }

        // Percent, e.g. "8.25"
        if let Some(raw) = lookup("CLASP_TAX_RATE") {
            match parse_percent(&raw) {
                Some(rate) => {
                    debug!(tax_rate = %rate, "Overriding tax rate from environment");
                    self.pricing.tax_rate_bps = rate.bps();
                }
                None => warn!(value = %raw, "Ignoring invalid CLASP_TAX_RATE"),
            }
        }

        if let Some(raw) = lookup("CLASP_PLATFORM_FEE") {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
                self.pricing.platform_fee_bps = None;
            } else {
                match parse_percent(trimmed) {
                    Some(rate) => self.pricing.platform_fee_bps = Some(rate.bps()),
                    None => warn!(value = %raw, "Ignoring invalid CLASP_PLATFORM_FEE"),
                }
            }
        }

        if let Some(raw) = lookup("CLASP_FEE_HANDLING") {
            match raw.parse::<FeeHandling>() {
                Ok(handling) => self.pricing.fee_handling = handling,
                Err(e) => warn!(error = %e, "Ignoring invalid CLASP_FEE_HANDLING"),
            }
        }

        if let Some(raw) = lookup("CLASP_REQUIRE_COMPONENT_SETUP") {
            match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.checkout.require_component_setup = true,
                "0" | "false" | "no" | "off" => self.checkout.require_component_setup = false,
                _ => warn!(value = %raw, "Ignoring invalid CLASP_REQUIRE_COMPONENT_SETUP"),
            }
        }
    }

    /// `register.toml` in the platform config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "clasp", "clasp-pos")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn tax_rate(&self) -> Rate {
        Rate::from_bps(self.pricing.tax_rate_bps)
    }

    pub fn platform_fee_rate(&self) -> Option<Rate> {
        self.pricing.platform_fee_bps.map(Rate::from_bps)
    }

    /// An empty cart carrying this register's tax and fee settings.
    pub fn new_cart(&self) -> Cart {
        Cart::new(
            self.tax_rate(),
            self.platform_fee_rate(),
            self.pricing.fee_handling,
        )
    }

    pub fn checkout_policy(&self) -> CheckoutPolicy {
        CheckoutPolicy {
            require_component_setup: self.checkout.require_component_setup,
        }
    }

    /// Renders cents with the configured symbol and decimals.
    pub fn format_currency(&self, cents: i64) -> String {
        let decimals = self.display.currency_decimals as u32;
        let divisor = 10_i64.pow(decimals);
        let whole = (cents / divisor).abs();
        let frac = (cents % divisor).abs();
        let sign = if cents < 0 { "-" } else { "" };

        if decimals > 0 {
            format!(
                "{}{}{}.{:0width$}",
                sign,
                self.display.currency_symbol,
                whole,
                frac,
                width = decimals as usize
            )
        } else {
            format!("{}{}{}", sign, self.display.currency_symbol, whole)
        }
    }
}

/// Parses a non-negative percentage such as `"8.25"` or `"8.25%"`.
fn parse_percent(raw: &str) -> Option<Rate> {
    let value: f64 = raw.trim().trim_end_matches('%').trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(Rate::from_percentage(value))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = RegisterConfig::default();
        assert_eq!(config.register.tenant_id, DEFAULT_TENANT_ID);
        assert!(config.tax_rate().is_zero());
        assert_eq!(config.platform_fee_rate(), None);
        assert_eq!(config.pricing.fee_handling, FeeHandling::PassToCustomer);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip_and_partial_file() {
        let mut config = RegisterConfig::default();
        config.pricing.tax_rate_bps = 825;
        config.pricing.platform_fee_bps = Some(500);
        config.pricing.fee_handling = FeeHandling::Absorb;

        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("fee_handling = \"absorb\""));
        let parsed: RegisterConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);

        let partial: RegisterConfig = toml::from_str("[pricing]\ntax_rate_bps = 700\n").unwrap();
        assert_eq!(partial.pricing.tax_rate_bps, 700);
        assert_eq!(partial.display.currency_symbol, "$");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RegisterConfig::default();
        config.apply_overrides_from(env(&[
            ("CLASP_TENANT_ID", "tenant-9"),
            ("CLASP_TAX_RATE", "8.25"),
            ("CLASP_PLATFORM_FEE", "5%"),
            ("CLASP_FEE_HANDLING", "absorb"),
            ("CLASP_REQUIRE_COMPONENT_SETUP", "yes"),
        ]));

        assert_eq!(config.register.tenant_id, "tenant-9");
        assert_eq!(config.pricing.tax_rate_bps, 825);
        assert_eq!(config.pricing.platform_fee_bps, Some(500));
        assert_eq!(config.pricing.fee_handling, FeeHandling::Absorb);
        assert!(config.checkout_policy().require_component_setup);
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let mut config = RegisterConfig::default();
        config.pricing.platform_fee_bps = Some(300);
        config.apply_overrides_from(env(&[
            ("CLASP_TAX_RATE", "lots"),
            ("CLASP_FEE_HANDLING", "split"),
            ("CLASP_REQUIRE_COMPONENT_SETUP", "maybe"),
        ]));
        assert_eq!(config, {
            let mut expected = RegisterConfig::default();
            expected.pricing.platform_fee_bps = Some(300);
            expected
        });

        config.apply_overrides_from(env(&[("CLASP_PLATFORM_FEE", "none")]));
        assert_eq!(config.platform_fee_rate(), None);
    }

    #[test]
    fn test_validation() {
        let mut config = RegisterConfig::default();
        config.pricing.tax_rate_bps = 10_001;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = RegisterConfig::default();
        config.register.tenant_id = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = RegisterConfig::default();
        config.display.currency_decimals = 9;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_new_cart_carries_settings() {
        let mut config = RegisterConfig::default();
        config.pricing.tax_rate_bps = 800;
        config.pricing.platform_fee_bps = Some(500);
        config.pricing.fee_handling = FeeHandling::Absorb;

        let cart = config.new_cart();
        assert!(cart.is_empty());
        assert_eq!(cart.tax_rate, Rate::from_bps(800));
        assert_eq!(cart.platform_fee_rate, Some(Rate::from_bps(500)));
        assert_eq!(cart.fee_handling, FeeHandling::Absorb);
    }

    #[test]
    fn test_format_currency() {
        let mut config = RegisterConfig::default();
        assert_eq!(config.format_currency(12390), "$123.90");
        assert_eq!(config.format_currency(-550), "-$5.50");
        assert_eq!(config.format_currency(5), "$0.05");

        config.display.currency_symbol = "¥".to_string();
        config.display.currency_decimals = 0;
        assert_eq!(config.format_currency(1500), "¥1500");
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("clasp-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join(CONFIG_FILE_NAME);

        let mut config = RegisterConfig::default();
        config.register.store_name = "Pop-up Market".to_string();
        config.pricing.tax_rate_bps = 725;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: RegisterConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
