use std::fs;
use std::path::Path;

use super::ScenarioRow;

pub(super) fn write_markdown(
    path: impl AsRef<Path>,
    run_id: &str,
    tolerance: f64,
    rows: &[ScenarioRow],
) -> std::io::Result<()> {
    fs::write(path, render_markdown(run_id, tolerance, rows))
}

fn render_markdown(run_id: &str, tolerance: f64, rows: &[ScenarioRow]) -> String {
    let passed = rows.iter().filter(|row| row.passed).count();
    let mut out = String::new();
    out.push_str(&format!("# Calibration Summary: {run_id}\n\n"));
    out.push_str(&format!(
        "Tolerance: {tolerance:.3} max absolute deviation. Passed {passed} of {} scenarios.\n\n",
        rows.len()
    ));
    out.push_str("| Scenario | Unknown | Method | Reference | Max dev | Mean dev | Col err | Row err | Acceptance | Entropy W/N/E | Result |\n");
    out.push_str("|----------|---------|--------|-----------|---------|----------|---------|---------|------------|---------------|--------|\n");

    for row in rows {
        let entropy = row
            .entropy
            .map(|[w, n, e]| format!("{w:.2} / {n:.2} / {e:.2}"))
            .unwrap_or_else(|| "-".to_string());
        let result = match (&row.error, row.passed) {
            (Some(err), _) => format!("Error: {}", err.replace('|', "\\|")),
            (None, true) => "Pass".to_string(),
            (None, false) => "Fail".to_string(),
        };
        out.push_str(&format!(
            "| {name} | {unknown} | {method} | {reference} | {max} | {mean} | {col} | {row_err} | {accept} | {entropy} | {result} |\n",
            name = row.scenario,
            unknown = row.unknown_tiles,
            method = row.method.as_deref().unwrap_or("-"),
            reference = row.reference_method.as_deref().unwrap_or("-"),
            max = fixed(row.max_abs_deviation, 4),
            mean = fixed(row.mean_abs_deviation, 4),
            col = scientific(row.max_column_error),
            row_err = scientific(row.max_row_error),
            accept = fixed(row.acceptance_ratio, 3),
        ));
    }

    out
}

fn fixed(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

fn scientific(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, passed: bool, error: Option<&str>) -> ScenarioRow {
        ScenarioRow {
            run_id: "r".to_string(),
            scenario: name.to_string(),
            actions: 4,
            unknown_tiles: 19,
            trials: 100,
            seed: 1,
            method: error.is_none().then(|| "sampling".to_string()),
            reference_method: error.is_none().then(|| "sampling".to_string()),
            max_abs_deviation: error.is_none().then_some(0.0125),
            mean_abs_deviation: error.is_none().then_some(0.004),
            max_column_error: error.is_none().then_some(0.0),
            max_row_error: error.is_none().then_some(0.0),
            acceptance_ratio: error.is_none().then_some(0.5),
            entropy: error.is_none().then_some([1.0, 2.0, 3.0]),
            certain_tiles: error.is_none().then_some([0, 0, 0]),
            passed,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn renders_one_line_per_scenario() {
        let rows = [
            row("opening", true, None),
            row("bad", false, Some("it is South's turn, not West's")),
        ];
        let md = render_markdown("demo", 0.02, &rows);
        assert!(md.starts_with("# Calibration Summary: demo"));
        assert!(md.contains("Passed 1 of 2 scenarios"));
        assert!(md.contains("| opening | 19 | sampling | sampling | 0.0125 | 0.0040 |"));
        assert!(md.contains("1.00 / 2.00 / 3.00"));
        assert!(md.contains("| bad | 19 | - | - |"));
        assert!(md.contains("Error: it is South's turn"));
    }
}
