use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::model::Value;
use crate::spec::{Axis, Corner, Placement, SettingsBundle};

/// Environment variable naming a JSON file with extra settings bundles.
pub const CONFIG_ENV: &str = "GRIDPLOT_CONFIG";

// ---------------------------------------------------------------------------
// Layer table
// ---------------------------------------------------------------------------

/// One entry of the layer table: canonical name, accepted aliases, placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDef {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub placement: Placement,
}

impl LayerDef {
    fn new(name: &str, aliases: &[&str], placement: Placement) -> Self {
        LayerDef {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            placement,
        }
    }

    fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

// ---------------------------------------------------------------------------
// ParseConfig
// ---------------------------------------------------------------------------

/// Immutable lookup tables consulted by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    pub layers: Vec<LayerDef>,
    /// Settings registry: bundle name → options.
    pub settings: BTreeMap<String, BTreeMap<String, Value>>,
}

/// Shape of a user override file. Only settings bundles can be added; the
/// layer table is closed because backends only know these placements.
#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    #[serde(default)]
    settings: BTreeMap<String, BTreeMap<String, Value>>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        let layers = vec![
            LayerDef::new("main", &[], Placement::Main),
            LayerDef::new("inset-top-left", &["insettl"], Placement::Inset(Corner::TopLeft)),
            LayerDef::new("inset-top-right", &["insettr"], Placement::Inset(Corner::TopRight)),
            LayerDef::new("inset-bottom-left", &["insetbl"], Placement::Inset(Corner::BottomLeft)),
            LayerDef::new("inset-bottom-right", &["insetbr"], Placement::Inset(Corner::BottomRight)),
            LayerDef::new("twin-x", &["twinx"], Placement::Twin(Axis::X)),
            LayerDef::new("twin-y", &["twiny"], Placement::Twin(Axis::Y)),
        ];

        let mut settings = BTreeMap::new();
        let mut bundle = |name: &str, options: &[(&str, Value)]| {
            settings.insert(
                name.to_string(),
                options
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect::<BTreeMap<_, _>>(),
            );
        };
        bundle("grid", &[("grid", Value::Bool(true))]);
        bundle("nogrid", &[("grid", Value::Bool(false))]);
        bundle("minorticks", &[("minor_ticks", Value::Bool(true))]);
        bundle("logx", &[("x_scale", Value::Text("log".into()))]);
        bundle("logy", &[("y_scale", Value::Text("log".into()))]);
        bundle(
            "loglog",
            &[
                ("x_scale", Value::Text("log".into())),
                ("y_scale", Value::Text("log".into())),
            ],
        );
        bundle("tight", &[("tight_layout", Value::Bool(true))]);
        bundle(
            "presentation",
            &[
                ("font_size", Value::Int(16)),
                ("line_width", Value::Float(2.5)),
            ],
        );
        bundle(
            "paper",
            &[
                ("font_size", Value::Int(9)),
                ("line_width", Value::Float(1.0)),
                ("dpi", Value::Int(300)),
            ],
        );

        ParseConfig { layers, settings }
    }
}

impl ParseConfig {
    /// Extend the settings registry from a JSON override file:
    ///
    /// ```json
    /// { "settings": { "big": { "font_size": 20, "line_width": 3.0 } } }
    /// ```
    pub fn load_overrides(mut self, path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let overrides: ConfigOverrides = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        for (name, options) in overrides.settings {
            log::debug!("settings bundle '{name}' from {}", path.display());
            self.settings.insert(name.to_ascii_lowercase(), options);
        }
        Ok(self)
    }

    /// Resolve a layer name or alias, case-insensitively.
    pub fn resolve_layer(&self, name: &str) -> Option<&LayerDef> {
        self.layers.iter().find(|def| def.matches(name.trim()))
    }

    pub fn setting(&self, name: &str) -> Option<SettingsBundle> {
        self.settings.get(name).map(|options| SettingsBundle {
            name: name.to_string(),
            options: options.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_canonical_and_alias() {
        let config = ParseConfig::default();
        assert_eq!(config.resolve_layer("main").map(|d| d.placement), Some(Placement::Main));
        let def = config.resolve_layer("InsetTL").unwrap();
        assert_eq!(def.name, "inset-top-left");
        assert_eq!(config.resolve_layer("TWIN-Y").unwrap().placement, Placement::Twin(Axis::Y));
        assert!(config.resolve_layer("bogus").is_none());
    }

    #[test]
    fn test_builtin_setting_lookup() {
        let config = ParseConfig::default();
        let grid = config.setting("grid").unwrap();
        assert_eq!(grid.options.get("grid"), Some(&Value::Bool(true)));
        assert!(config.setting("sparkles").is_none());
    }

    #[test]
    fn test_load_overrides_extends_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"settings": {{"Big": {{"font_size": 20, "grid": true}}}}}}"#).unwrap();

        let config = ParseConfig::default().load_overrides(file.path()).unwrap();
        let big = config.setting("big").unwrap();
        assert_eq!(big.options.get("font_size"), Some(&Value::Int(20)));
        // built-ins survive
        assert!(config.setting("loglog").is_some());
    }

    #[test]
    fn test_load_overrides_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(ParseConfig::default().load_overrides(file.path()).is_err());
    }
}
