use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::theme::BuiltinTheme;

/// Top-level rendering configuration (YAML or programmatic).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub theme: String,
    pub figure: FigureConfig,
    pub font: FontConfig,
    pub axes: AxesConfig,
    pub grid: GridConfig,
    pub points: PointConfig,
    pub colors: ColorsConfig,
    /// Overrides the palette named by the artifact.
    pub palette: Option<String>,
}

impl Default for VizConfig {
    fn default() -> Self {
        BuiltinTheme::Whitegrid.base_config()
    }
}

impl VizConfig {
    /// Palette for an artifact that asks for `requested`.
    pub fn palette_colors(&self, requested: &str) -> Vec<Color> {
        crate::color::palette_colors(self.palette.as_deref().unwrap_or(requested))
    }
}

/// Figure geometry. Faceted plots grow horizontally, one panel at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: f64,
    pub panel_width: f64,
    pub panel_height: f64,
    pub panel_gap: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 518.4,        // 7.2" * 72
            panel_width: 230.4,  // 3.2" * 72
            panel_height: 288.0, // 4" * 72
            panel_gap: 14.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub family: String,
    pub size: f64,
    pub label_size: f64,
    pub tick_size: f64,
    pub title_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "DejaVu Sans, Arial, sans-serif".into(),
            size: 10.0,
            label_size: 11.0,
            tick_size: 9.0,
            title_size: 13.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    pub tick_direction: String,
    pub show_top_ticks: bool,
    pub show_right_ticks: bool,
    pub tick_length: f64,
    /// Draw only the left and bottom spines.
    pub despine: bool,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            tick_direction: "out".into(),
            show_top_ticks: false,
            show_right_ticks: false,
            tick_length: 4.0,
            despine: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub show: bool,
    pub color: Color,
    pub alpha: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { show: true, color: Color::hex("#CBD5E1"), alpha: 0.7 }
    }
}

/// Point-plot geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PointConfig {
    pub marker_size: f64,
    pub line_width: f64,
    /// Cap width as a fraction of one x category.
    pub capsize: f64,
    /// Horizontal offset between hue series, fraction of one x category.
    pub dodge: f64,
}

impl Default for PointConfig {
    fn default() -> Self {
        Self { marker_size: 4.0, line_width: 1.8, capsize: 0.1, dodge: 0.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    pub frame: Color,
    pub reference_line: Color,
    pub annotation: Color,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            frame: Color::hex("#333333"),
            reference_line: Color::hex("#6B7280"),
            annotation: Color::rgb(100, 100, 100),
        }
    }
}

/// Resolve a VizConfig from an optional theme name and YAML overrides.
///
/// Priority: user YAML overrides → theme base config. A `theme:` key in the
/// YAML selects the base theme and wins over `theme`.
pub fn resolve_config(theme: Option<&str>, user_yaml: Option<&str>) -> crate::Result<VizConfig> {
    let cfg_err = |e: serde_yaml_ng::Error| crate::RenderError::Config(e.to_string());
    let user: Option<serde_yaml_ng::Value> =
        user_yaml.map(serde_yaml_ng::from_str::<serde_yaml_ng::Value>).transpose().map_err(cfg_err)?;
    let theme_name = user
        .as_ref()
        .and_then(|v| v.get("theme"))
        .and_then(|t| t.as_str())
        .or(theme)
        .unwrap_or("whitegrid");
    let base = BuiltinTheme::parse(theme_name).base_config();
    match user {
        None => Ok(base),
        Some(over) => {
            let mut merged = serde_yaml_ng::to_value(&base).map_err(cfg_err)?;
            merge_yaml(&mut merged, over);
            serde_yaml_ng::from_value(merged).map_err(cfg_err)
        }
    }
}

fn merge_yaml(base: &mut serde_yaml_ng::Value, over: serde_yaml_ng::Value) {
    match (base, over) {
        (_, serde_yaml_ng::Value::Null) => {}
        (serde_yaml_ng::Value::Mapping(b), serde_yaml_ng::Value::Mapping(o)) => {
            for (k, v) in o {
                match b.get_mut(&k) {
                    Some(slot) => merge_yaml(slot, v),
                    None => {
                        b.insert(k, v);
                    }
                }
            }
        }
        (slot, v) => *slot = v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_whitegrid() {
        let c = resolve_config(None, None).unwrap();
        assert_eq!(c.theme, "whitegrid");
        assert!(c.grid.show);
        assert_eq!(c.palette_colors("Set2")[0], Color::hex("#66c2a5"));
    }

    #[test]
    fn yaml_overrides_merge_into_theme() {
        let yaml = "theme: paper\nfont:\n  title_size: 20\npalette: set1\n";
        let c = resolve_config(Some("ticks"), Some(yaml)).unwrap();
        assert_eq!(c.theme, "paper");
        assert_eq!(c.font.title_size, 20.0);
        // untouched fields keep the paper theme's values
        assert_eq!(c.axes.tick_direction, "in");
        assert_eq!(c.palette_colors("Set2")[0], Color::hex("#e41a1c"));
    }

    #[test]
    fn bad_yaml_is_a_config_error() {
        let err = resolve_config(None, Some("font: [1, 2")).unwrap_err();
        assert!(matches!(err, crate::RenderError::Config(_)));
    }
}
