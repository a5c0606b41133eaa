use crate::color::Color;
use crate::config::*;

/// Built-in theme presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTheme {
    /// Light grid, outward ticks, open top and right spines.
    Whitegrid,
    /// Same without the grid.
    Ticks,
    /// Boxed axes with inward ticks on all four sides.
    Paper,
}

impl BuiltinTheme {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "ticks" => Self::Ticks,
            "paper" => Self::Paper,
            _ => Self::Whitegrid,
        }
    }

    pub fn base_config(self) -> VizConfig {
        match self {
            Self::Whitegrid => whitegrid(),
            Self::Ticks => ticks(),
            Self::Paper => paper(),
        }
    }
}

fn whitegrid() -> VizConfig {
    VizConfig {
        theme: "whitegrid".into(),
        figure: FigureConfig::default(),
        font: FontConfig::default(),
        axes: AxesConfig::default(),
        grid: GridConfig::default(),
        points: PointConfig::default(),
        colors: ColorsConfig::default(),
        palette: None,
    }
}

fn ticks() -> VizConfig {
    VizConfig {
        theme: "ticks".into(),
        grid: GridConfig { show: false, ..GridConfig::default() },
        ..whitegrid()
    }
}

fn paper() -> VizConfig {
    VizConfig {
        theme: "paper".into(),
        figure: FigureConfig { panel_width: 201.6, panel_height: 252.0, ..FigureConfig::default() },
        font: FontConfig {
            family: "Times New Roman, serif".into(),
            size: 9.0,
            label_size: 10.0,
            tick_size: 8.0,
            title_size: 11.0,
        },
        axes: AxesConfig {
            tick_direction: "in".into(),
            show_top_ticks: true,
            show_right_ticks: true,
            tick_length: 5.0,
            despine: false,
        },
        grid: GridConfig { show: false, ..GridConfig::default() },
        colors: ColorsConfig { frame: Color::rgb(0, 0, 0), ..ColorsConfig::default() },
        ..whitegrid()
    }
}
