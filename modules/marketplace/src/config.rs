use serde::{Deserialize, Serialize};

/// Configuration for the marketplace module (`modules.marketplace` in YAML).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketplaceConfig {
    /// Emails that become admin when their account is first created.
    #[serde(default)]
    pub bootstrap_admins: Vec<String>,
    /// Domain of the placeholder email given to accounts created without one.
    #[serde(default = "default_placeholder_email_domain")]
    pub placeholder_email_domain: String,
    /// Images allowed per listing; values above 5 are clamped to 5.
    #[serde(default = "default_max_images")]
    pub max_images: usize,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Serve `/openapi.json`.
    #[serde(default = "default_true")]
    pub enable_docs: bool,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            bootstrap_admins: Vec::new(),
            placeholder_email_domain: default_placeholder_email_domain(),
            max_images: default_max_images(),
            cors_enabled: true,
            enable_docs: true,
        }
    }
}

fn default_placeholder_email_domain() -> String {
    "campus-market.local".to_string()
}

fn default_max_images() -> usize {
    5
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: MarketplaceConfig =
            serde_json::from_value(serde_json::json!({ "bootstrap_admins": ["a@x.edu"] }))
                .unwrap();
        assert_eq!(cfg.bootstrap_admins, vec!["a@x.edu".to_string()]);
        assert_eq!(cfg.max_images, 5);
        assert_eq!(cfg.placeholder_email_domain, "campus-market.local");
        assert!(cfg.cors_enabled);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res: Result<MarketplaceConfig, _> =
            serde_json::from_value(serde_json::json!({ "max_imgs": 3 }));
        assert!(res.is_err());
    }
}
