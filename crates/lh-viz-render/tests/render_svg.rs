use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use lh_data::features::{default_quartile_labels, TREATED_X_POST_X_SPENDING};
use lh_data::{add_plot_features, generate, prepare, ColumnMap, PrepareConfig, SimulationConfig};
use lh_inference::{run_specifications, DididSpecification, FitOptions};
use lh_viz::{coefficient_artifact, point_plot, standard_point_plots, CiMethod};
use lh_viz_render::config::resolve_config;
use lh_viz_render::{render_svg, render_to_file, RenderError};

fn tmp_path(filename: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("lanham_render_{}_{}_{}", std::process::id(), nanos, filename));
    p
}

fn prepared() -> lh_data::Prepared {
    let cfg = SimulationConfig { n_per_cell: 40, seed: 9, ..SimulationConfig::default() };
    let raw = generate(&cfg, &ColumnMap::default()).unwrap();
    let mut p = prepare(&raw, &PrepareConfig::default()).unwrap();
    add_plot_features(&mut p, &PrepareConfig::default()).unwrap();
    p
}

#[test]
fn point_plot_svg_has_one_panel_per_quartile() {
    let p = prepared();
    let spec = &standard_point_plots(&ColumnMap::default(), &default_quartile_labels())[0];
    let art = point_plot(&p.table, spec, CiMethod::Normal, 0.95).unwrap();
    let json = serde_json::to_string(&art).unwrap();

    let svg = render_svg(&json, "point_plot", &resolve_config(None, None).unwrap()).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("DiDiD: Employment Probability by Lanham Spending Quartile"));
    for q in default_quartile_labels() {
        assert!(svg.contains(&format!("spending_quartile = {}", q)), "missing panel {}", q);
    }
    assert!(svg.contains("Treated (Mothers)"));
    assert!(svg.contains("1950 (Post)"));
    // one joining line per hue per panel
    assert_eq!(svg.matches("<polyline").count(), 8);
    // Set1 red for the first hue
    assert!(svg.contains("#e41a1c"));
}

#[test]
fn palette_override_and_theme() {
    let p = prepared();
    let spec = &standard_point_plots(&ColumnMap::default(), &default_quartile_labels())[2];
    let art = point_plot(&p.table, spec, CiMethod::Bootstrap { n_boot: 200, seed: 1 }, 0.9).unwrap();
    let json = serde_json::to_string(&art).unwrap();

    let cfg = resolve_config(Some("paper"), Some("palette: set1\n")).unwrap();
    let svg = render_svg(&json, "point_plot", &cfg).unwrap();
    assert!(svg.contains("#e41a1c"));
    assert!(!svg.contains("#66c2a5"));
    assert!(svg.contains("90% bootstrap intervals (200 resamples)"));
}

#[test]
fn coefficient_plot_renders_every_model() {
    let p = prepared();
    let specs = DididSpecification::standard(&ColumnMap::default());
    let fits = run_specifications(&p.table, &specs, &FitOptions::default(), 1).unwrap();
    let art = coefficient_artifact(&fits, TREATED_X_POST_X_SPENDING, "Triple interaction").unwrap();
    let json = serde_json::to_string(&art).unwrap();

    let path = tmp_path("coefficients.svg");
    render_to_file(&json, "coefficients", &path, &resolve_config(None, None).unwrap()).unwrap();
    let svg = std::fs::read_to_string(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    for label in ["(1) emp", "(2) HRSWORK1", "(3) part_time", "(4) HRSWORK1"] {
        assert!(svg.contains(label), "missing {}", label);
    }
    assert!(svg.contains("stroke-dasharray"));
}

#[test]
fn unknown_kind_and_format_are_rejected() {
    let cfg = resolve_config(None, None).unwrap();
    assert!(matches!(render_svg("{}", "pie", &cfg), Err(RenderError::UnknownKind(_))));
    assert!(matches!(render_svg("{", "point_plot", &cfg), Err(RenderError::Deserialize(_))));
    let err = render_to_file("{}", "coefficients", &tmp_path("x.png"), &cfg).unwrap_err();
    assert!(matches!(err, RenderError::UnknownKind(_)));
}
