//! `lanham run` orchestration: load, prepare, fit, report, plot, manifest.

use anyhow::{Context, Result};
use lh_data::features::TREATED_X_POST_X_SPENDING;
use lh_data::{add_plot_features, prepare, read_table, Prepared};
use lh_inference::{run_specifications, DididSpecification, FittedModel};
use lh_viz::{
    coefficient_artifact, comparison_table, default_regressor_order, point_plot, regression_summary,
    render_text, standard_point_plots, COMPARISON_TITLE,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::config::AnalysisConfig;

pub const COEFFICIENT_PLOT_TITLE: &str = "Triple Interaction Across Specifications";

/// What one run produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub comparison_text: String,
    pub written: Vec<PathBuf>,
}

pub fn load_prepared(input: &Path, cfg: &AnalysisConfig) -> Result<Prepared> {
    tracing::info!(path = %input.display(), "loading survey extract");
    let raw = read_table(input).with_context(|| format!("reading {}", input.display()))?;
    tracing::info!(rows = raw.n_rows(), columns = raw.column_names().len(), "extract loaded");
    Ok(prepare(&raw, &cfg.prepare)?)
}

pub fn fit_all(prepared: &Prepared, cfg: &AnalysisConfig) -> Result<Vec<FittedModel>> {
    let specs = DididSpecification::standard(&cfg.prepare.columns);
    let opts = cfg.regression.fit_options();
    let fits = run_specifications(&prepared.table, &specs, &opts, cfg.regression.threads)?;
    for m in &fits {
        tracing::info!(
            label = %m.label,
            outcome = %m.outcome,
            n_obs = m.n_obs,
            n_excluded = m.n_excluded,
            "fit complete"
        );
    }
    Ok(fits)
}

/// Write `plot_<n>.json` and `plot_<n>.svg` for the four point plots.
///
/// Needs the quartile column from [`add_plot_features`].
pub fn write_point_plots(
    prepared: &Prepared,
    cfg: &AnalysisConfig,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let render_cfg = cfg.viz.render_config()?;
    let specs = standard_point_plots(&cfg.prepare.columns, &cfg.prepare.quartile_labels);
    let mut written = Vec::new();
    for (i, spec) in specs.iter().enumerate() {
        let art = point_plot(&prepared.table, spec, cfg.viz.ci_method(), cfg.viz.confidence)?;
        let json_path = out_dir.join(format!("plot_{}.json", i + 1));
        write_pretty_json(&json_path, &art)?;
        let svg_path = out_dir.join(format!("plot_{}.svg", i + 1));
        let svg = lh_viz_render::render_point_plot(&art, &render_cfg)?;
        lh_viz_render::output::svg::save_svg(&svg, &svg_path)?;
        tracing::info!(plot = %spec.title, n_excluded = art.n_excluded, "point plot written");
        written.push(json_path);
        written.push(svg_path);
    }
    Ok(written)
}

pub fn run(cfg: &AnalysisConfig) -> Result<RunOutput> {
    let Some(input) = cfg.input.as_deref() else {
        anyhow::bail!("no input file: pass --input or set `input` in the config");
    };
    let out_dir = cfg.out_dir.as_path();
    prepare_out_dir(out_dir, cfg.overwrite)?;

    let mut prepared = load_prepared(input, cfg)?;
    let mut written = Vec::new();

    let fits = fit_all(&prepared, cfg)?;
    let precision = cfg.regression.precision;
    for (i, m) in fits.iter().enumerate() {
        let path = out_dir.join(format!("summary_{}.txt", i + 1));
        write_text(&path, &regression_summary(m, precision))?;
        written.push(path);
    }
    let fits_path = out_dir.join("fits.json");
    write_pretty_json(&fits_path, &fits)?;
    written.push(fits_path);

    let order = match &cfg.regression.order {
        Some(o) => o.clone(),
        None => default_regressor_order(&cfg.prepare.columns),
    };
    let table = comparison_table(&fits, COMPARISON_TITLE, &order, &cfg.regression.stars)?;
    let comparison_text = render_text(&table, precision);
    let txt_path = out_dir.join("comparison.txt");
    write_text(&txt_path, &comparison_text)?;
    let json_path = out_dir.join("comparison.json");
    write_pretty_json(&json_path, &table)?;
    written.extend([txt_path, json_path]);

    if cfg.viz.enabled {
        match add_plot_features(&mut prepared, &cfg.prepare) {
            Ok(()) => written.extend(write_point_plots(&prepared, cfg, out_dir)?),
            Err(e) => tracing::warn!(error = %e, "spending quartiles unavailable; point plots skipped"),
        }

        let coef = coefficient_artifact(&fits, TREATED_X_POST_X_SPENDING, COEFFICIENT_PLOT_TITLE)?;
        let svg = lh_viz_render::render_coefficients(&coef, &cfg.viz.render_config()?)?;
        let path = out_dir.join("coefficients.svg");
        lh_viz_render::output::svg::save_svg(&svg, &path)?;
        written.push(path);
    }

    let report_path = out_dir.join("prepare_report.json");
    write_pretty_json(&report_path, &prepared.report)?;
    written.push(report_path);

    let manifest = write_manifest(out_dir, input)?;
    written.push(manifest);
    tracing::info!(out_dir = %out_dir.display(), files = written.len(), "run complete");
    Ok(RunOutput { comparison_text, written })
}

fn prepare_out_dir(dir: &Path, overwrite: bool) -> Result<()> {
    if dir.exists() {
        if !dir.is_dir() {
            anyhow::bail!("out_dir exists but is not a directory: {}", dir.display());
        }
        if !overwrite && dir.read_dir()?.next().is_some() {
            anyhow::bail!(
                "out_dir must be empty (use --overwrite to replace known files): {}",
                dir.display()
            );
        }
    } else {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    Ok(())
}

pub fn write_pretty_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::debug!(path = %path.display(), "wrote json");
    Ok(())
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    let out = h.finalize();
    let mut s = String::with_capacity(64);
    for b in out {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

fn sha256_file(path: &Path) -> Result<String> {
    Ok(sha256_hex(&std::fs::read(path)?))
}

fn file_size(path: &Path) -> Result<u64> {
    Ok(std::fs::metadata(path)?.len())
}

fn walk_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<PathBuf> =
        std::fs::read_dir(dir)?.filter_map(|e| e.ok().map(|e| e.path())).collect();
    entries.sort();
    for p in entries {
        if p.is_dir() {
            walk_files(&p, out)?;
        } else if p.is_file() {
            out.push(p);
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ManifestFile {
    path: String,
    bytes: u64,
    sha256: String,
}

#[derive(Debug, Serialize)]
struct Manifest {
    schema_version: &'static str,
    tool: &'static str,
    tool_version: &'static str,
    input: ManifestFile,
    files: Vec<ManifestFile>,
}

/// `manifest.json`: input hash plus every file under `out_dir`, sorted.
pub fn write_manifest(out_dir: &Path, input: &Path) -> Result<PathBuf> {
    let mut files = Vec::new();
    walk_files(out_dir, &mut files)?;
    let mut entries = Vec::new();
    for f in files {
        let rel = f.strip_prefix(out_dir).unwrap_or(&f);
        if rel == Path::new("manifest.json") {
            continue;
        }
        entries.push(ManifestFile {
            path: rel.to_string_lossy().replace('\\', "/"),
            bytes: file_size(&f)?,
            sha256: sha256_file(&f)?,
        });
    }
    let manifest = Manifest {
        schema_version: "lanham_run_manifest_v0",
        tool: "lanham",
        tool_version: env!("CARGO_PKG_VERSION"),
        input: ManifestFile {
            path: input.to_string_lossy().into_owned(),
            bytes: file_size(input)?,
            sha256: sha256_file(input)
                .with_context(|| format!("hashing {}", input.display()))?,
        },
        files: entries,
    };
    let path = out_dir.join("manifest.json");
    write_pretty_json(&path, &manifest)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn run_without_input_is_an_error() {
        let err = run(&AnalysisConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no input file"));
    }
}
