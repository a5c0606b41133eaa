//! Per-model plain-text regression summary.

use lh_inference::FittedModel;

/// Coefficient table, omitted regressors and fit statistics for one model.
pub fn regression_summary(model: &FittedModel, precision: usize) -> String {
    let stat = model.inference.statistic_label();
    let level = format!("{:.0}%", model.confidence * 100.0);
    let header = [
        String::new(),
        "coef".to_string(),
        "std err".to_string(),
        stat.to_string(),
        format!("P>|{}|", stat),
        format!("[{} lower", level),
        "upper]".to_string(),
    ];
    let rows: Vec<[String; 7]> = model
        .coefficients
        .iter()
        .map(|c| {
            [
                c.name.clone(),
                format!("{:.*}", precision, c.estimate),
                format!("{:.*}", precision, c.std_error),
                format!("{:.3}", c.statistic),
                format!("{:.3}", c.p_value),
                format!("{:.*}", precision, c.ci_lower),
                format!("{:.*}", precision, c.ci_upper),
            ]
        })
        .collect();

    let mut widths = [0usize; 7];
    for line in std::iter::once(&header).chain(&rows) {
        for (w, cell) in widths.iter_mut().zip(line.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let total = widths.iter().sum::<usize>() + 2 * 6;
    let fmt_line = |line: &[String; 7]| -> String {
        line.iter()
            .zip(widths.iter())
            .enumerate()
            .map(|(j, (c, w))| if j == 0 { format!("{:<w$}", c, w = *w) } else { format!("{:>w$}", c, w = *w) })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut out = String::new();
    out.push_str(&format!("Model {}: {} (sample: {})\n", model.label, model.outcome, model.sample));
    out.push_str(&"=".repeat(total));
    out.push('\n');
    out.push_str(&format!("Fixed effects:    {}\n", model.fixed_effects.join(", ")));
    out.push_str(&format!(
        "Clustered by:     {} ({} clusters)\n",
        model.cluster_variable, model.n_clusters
    ));
    out.push_str(&format!("Observations:     {} ({} excluded for missing values)\n", model.n_obs, model.n_excluded));
    out.push_str(&format!("R-squared:        {:.*}\n", precision, model.r_squared));
    out.push_str(&format!("Adj. R-squared:   {:.*}\n", precision, model.adj_r_squared));
    out.push_str(&format!("Within R-squared: {:.*}\n", precision, model.r_squared_within));
    out.push_str(&"-".repeat(total));
    out.push('\n');
    out.push_str(fmt_line(&header).trim_end());
    out.push('\n');
    out.push_str(&"-".repeat(total));
    out.push('\n');
    for row in &rows {
        out.push_str(&fmt_line(row));
        out.push('\n');
    }
    out.push_str(&"=".repeat(total));
    out.push('\n');
    for o in &model.omitted {
        out.push_str(&format!("Omitted: {} ({})\n", o.name, o.reason.describe()));
    }
    if !model.converged {
        out.push_str("Warning: fixed-effect absorption did not converge.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lh_inference::econometrics::{OmissionReason, Omitted};
    use lh_inference::{Coefficient, Inference};

    fn model(inference: Inference) -> FittedModel {
        FittedModel {
            label: "(3)".into(),
            outcome: "part_time".into(),
            sample: "emp == 1".into(),
            coefficients: vec![Coefficient {
                name: "treated_x_post_x_spending".into(),
                estimate: 0.012345,
                std_error: 0.00321,
                statistic: 3.8458,
                p_value: 0.00012,
                ci_lower: 0.006054,
                ci_upper: 0.018636,
            }],
            omitted: vec![Omitted {
                name: "rlanham_012".into(),
                reason: OmissionReason::AbsorbedByFixedEffects,
            }],
            fixed_effects: vec!["statefip".into(), "age".into()],
            cluster_variable: "statefip".into(),
            n_obs: 5000,
            n_excluded: 12,
            n_clusters: 48,
            df_absorbed: 87,
            df_resid: 4908,
            r_squared: 0.05,
            adj_r_squared: 0.03,
            r_squared_within: 0.004,
            rss: 900.0,
            inference,
            confidence: 0.95,
            converged: true,
            vcov: vec![vec![0.00321 * 0.00321]],
        }
    }

    #[test]
    fn lists_coefficients_and_omissions() {
        let text = regression_summary(&model(Inference::Normal), 4);
        assert!(text.starts_with("Model (3): part_time (sample: emp == 1)"));
        assert!(text.contains("P>|z|"));
        assert!(text.contains("[95% lower"));
        assert!(text.contains("0.0123"));
        assert!(text.contains("Omitted: rlanham_012 (absorbed by the fixed effects)"));
        assert!(text.contains("statefip (48 clusters)"));
        assert!(text.contains("5000 (12 excluded"));
        assert!(!text.contains("did not converge"));
    }

    #[test]
    fn student_t_header() {
        let text = regression_summary(&model(Inference::StudentT), 3);
        assert!(text.contains("P>|t|"));
    }
}
