use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_lanham"))
}

fn tmp_path(filename: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("lanham_cli_{}_{}_{}", std::process::id(), nanos, filename));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn simulate(name: &str) -> PathBuf {
    let data = tmp_path(name);
    let out = run(&["simulate", "-o", data.to_str().unwrap(), "--seed", "3", "--n-per-cell", "80"]);
    assert!(out.status.success(), "simulate failed: {}", String::from_utf8_lossy(&out.stderr));
    data
}

#[test]
fn fit_prints_model_json() {
    let data = simulate("fit.csv");
    let out = run(&[
        "fit",
        "--input",
        data.to_str().unwrap(),
        "--outcome",
        "HRSWORK1",
        "--sample",
        "employed",
    ]);
    assert!(out.status.success(), "fit failed: {}", String::from_utf8_lossy(&out.stderr));

    // Warnings go to stderr; stdout stays parseable JSON.
    assert!(String::from_utf8_lossy(&out.stderr).contains("regressor omitted"));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["outcome"], "HRSWORK1");
    assert_eq!(v["sample"], "emp == 1");
    assert_eq!(v["cluster_variable"], "statefip");
    assert_eq!(v["n_clusters"], 8);

    let coefs = v["coefficients"].as_array().unwrap();
    let triple = coefs
        .iter()
        .find(|c| c["name"] == "treated_x_post_x_spending")
        .expect("triple interaction estimated");
    let se = triple["std_error"].as_f64().unwrap();
    assert!(triple["estimate"].as_f64().unwrap().is_finite());
    assert!(se.is_finite() && se > 0.0);

    // State-level spending is absorbed by the state fixed effects.
    let omitted: Vec<&str> =
        v["omitted"].as_array().unwrap().iter().map(|o| o["name"].as_str().unwrap()).collect();
    assert!(omitted.contains(&"rlanham_012"));

    let _ = std::fs::remove_file(&data);
}

#[test]
fn fit_summary_to_file() {
    let data = simulate("summary.csv");
    let path = tmp_path("summary.txt");
    let out = run(&[
        "fit",
        "-i",
        data.to_str().unwrap(),
        "--outcome",
        "emp",
        "--summary",
        "-o",
        path.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "fit failed: {}", String::from_utf8_lossy(&out.stderr));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("statefip (8 clusters)"));
    assert!(text.contains("treated_x_post_x_spending"));

    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(&data);
}

#[test]
fn fit_unknown_outcome_fails() {
    let data = simulate("bad.csv");
    let out = run(&["fit", "--input", data.to_str().unwrap(), "--outcome", "wages"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("wages"));
    let _ = std::fs::remove_file(&data);
}

#[test]
fn viz_writes_four_plots() {
    let data = simulate("viz.csv");
    let out_dir = tmp_path("viz_out");
    let out = run(&[
        "viz",
        "--input",
        data.to_str().unwrap(),
        "--out-dir",
        out_dir.to_str().unwrap(),
        "--ci",
        "bootstrap",
        "--n-boot",
        "50",
        "--seed",
        "5",
        "--theme",
        "paper",
    ]);
    assert!(out.status.success(), "viz failed: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8(out.stdout).unwrap().lines().count(), 8);

    for n in 1..=4 {
        let svg = std::fs::read_to_string(out_dir.join(format!("plot_{}.svg", n))).unwrap();
        assert!(svg.contains("95% bootstrap intervals (50 resamples)"));
        let art: serde_json::Value =
            serde_json::from_slice(&std::fs::read(out_dir.join(format!("plot_{}.json", n))).unwrap())
                .unwrap();
        assert_eq!(art["schema_version"], "lanham_point_plot_v0");
        assert_eq!(art["panels"].as_array().unwrap().len(), 4);
    }

    let _ = std::fs::remove_dir_all(&out_dir);
    let _ = std::fs::remove_file(&data);
}
