//! Plotly figure JSON for the dashboard.
//!
//! Figures are plain `{data, layout}` objects rendered client-side by
//! Plotly.js; no chart state lives on the server.

use serde::Serialize;
use serde_json::{json, Value};

use vetlens_common::ModelKind;

use crate::bootstrap::{correlation_ci, BootstrapConfig};
use crate::metrics::linear_regression;
use crate::results::AnalysisResults;

/// Payload for `GET /get_charts`.
#[derive(Debug, Serialize)]
pub struct ChartBundle {
    pub correlation_chart: Value,
    pub mae_chart: Value,
    pub scatter_charts: Vec<Value>,
    pub model_list: Vec<String>,
    pub best_model: String,
    pub second_best_model: String,
    pub performance_metrics: Value,
    pub correlation_cis: Value,
}

/// Build every figure the dashboard shows after an analysis.
pub fn build_charts(results: &AnalysisResults, bootstrap: &BootstrapConfig) -> ChartBundle {
    let star = results.star_series();

    // Bootstrap CI per model, reused for error bars and scatter titles.
    let cis: Vec<(ModelKind, Option<(f64, f64)>)> = ModelKind::ALL
        .into_iter()
        .map(|kind| (kind, correlation_ci(&results.model_series(kind), &star, bootstrap)))
        .collect();

    let by_mae = results.models_by_mae();
    let model_list: Vec<String> =
        ModelKind::ALL.iter().map(|m| m.display_name().to_string()).collect();

    ChartBundle {
        correlation_chart: correlation_chart(results, &cis),
        mae_chart: mae_chart(results),
        scatter_charts: ModelKind::ALL
            .into_iter()
            .zip(cis.iter())
            .map(|(kind, (_, ci))| scatter_chart(results, kind, *ci))
            .collect(),
        model_list,
        best_model: by_mae[0].display_name().to_string(),
        second_best_model: by_mae[1].display_name().to_string(),
        performance_metrics: results.model_comparison(),
        correlation_cis: json!(cis
            .iter()
            .map(|(kind, ci)| {
                let (lower, upper) = ci.unwrap_or((f64::NAN, f64::NAN));
                (kind.display_name().to_string(), json!({ "lower": lower, "upper": upper }))
            })
            .collect::<serde_json::Map<String, Value>>()),
    }
}

/// Bar chart of Pearson r per model with asymmetric bootstrap error bars.
fn correlation_chart(results: &AnalysisResults, cis: &[(ModelKind, Option<(f64, f64)>)]) -> Value {
    let names: Vec<&str> = ModelKind::ALL.iter().map(|m| m.display_name()).collect();
    let correlations: Vec<f64> =
        ModelKind::ALL.iter().map(|m| results.performance[m].correlation).collect();

    let plus: Vec<f64> = cis
        .iter()
        .zip(&correlations)
        .map(|((_, ci), r)| ci.map(|(_, hi)| (hi - r).max(0.0)).unwrap_or(0.0))
        .collect();
    let minus: Vec<f64> = cis
        .iter()
        .zip(&correlations)
        .map(|((_, ci), r)| ci.map(|(lo, _)| (r - lo).max(0.0)).unwrap_or(0.0))
        .collect();

    json!({
        "data": [{
            "type": "bar",
            "x": names,
            "y": correlations,
            "name": "Pearson r",
            "error_y": {
                "type": "data",
                "symmetric": false,
                "array": plus,
                "arrayminus": minus,
            },
        }],
        "layout": {
            "title": "モデル性能比較: 相関係数 (95%信頼区間付き)",
            "xaxis": { "title": "モデル" },
            "yaxis": { "title": "ピアソン相関係数" },
            "showlegend": false,
        },
    })
}

/// Bar chart of MAE per model.
fn mae_chart(results: &AnalysisResults) -> Value {
    let names: Vec<&str> = ModelKind::ALL.iter().map(|m| m.display_name()).collect();
    let mae: Vec<f64> = ModelKind::ALL.iter().map(|m| results.performance[m].mae).collect();

    json!({
        "data": [{
            "type": "bar",
            "x": names,
            "y": mae,
            "name": "MAE",
            "marker": { "color": "orange" },
        }],
        "layout": {
            "title": "モデル性能比較: 平均絶対誤差 (MAE)",
            "xaxis": { "title": "モデル" },
            "yaxis": { "title": "平均絶対誤差" },
            "showlegend": false,
        },
    })
}

/// Scatter of hospital means (model score vs star score) with a
/// least-squares regression line.
fn scatter_chart(results: &AnalysisResults, kind: ModelKind, ci: Option<(f64, f64)>) -> Value {
    let x = results.model_series(kind);
    let y = results.star_series();
    let hover: Vec<String> = results
        .hospitals
        .iter()
        .map(|h| format!("病院ID: {}", h.hospital_id))
        .collect();

    let mut data = vec![json!({
        "type": "scatter",
        "mode": "markers",
        "x": x,
        "y": y,
        "text": hover,
        "hovertemplate": "<b>%{text}</b><br>口コミスコア: %{x:.3f}<br>星評価スコア: %{y:.3f}<extra></extra>",
        "marker": {
            "size": 10,
            "opacity": 0.7,
            "color": "blue",
            "line": { "width": 1, "color": "darkblue" },
        },
        "name": "病院データ",
    })];

    let r = results.performance[&kind].correlation;
    if let Some((slope, intercept)) = linear_regression(&x, &y) {
        let (x_min, x_max) = x
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        data.push(json!({
            "type": "scatter",
            "mode": "lines",
            "x": [x_min, x_max],
            "y": [slope * x_min + intercept, slope * x_max + intercept],
            "line": { "color": "red", "width": 2 },
            "name": format!("回帰線 (r={r:.3})"),
        }));
    }

    let ci_text = ci
        .map(|(lo, hi)| format!(" (95%CI: [{lo:.3}, {hi:.3}])"))
        .unwrap_or_default();

    json!({
        "data": data,
        "layout": {
            "title": format!(
                "{}<br>相関係数 r = {r:.3}{ci_text}<br>病院数: {}",
                kind.display_name(),
                results.hospitals.len()
            ),
            "xaxis": { "title": "平均口コミスコア" },
            "yaxis": { "title": "平均星評価スコア" },
            "width": 400,
            "height": 400,
            "showlegend": true,
        },
    })
}
