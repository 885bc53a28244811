//! Dashboard handler — the single-page UI.

use axum::extract::State;
use axum::response::Html;

use vetlens_common::ModelKind;

use crate::state::SharedState;

pub async fn dashboard(State(state): State<SharedState>) -> Html<String> {
    let has_dataset = state.dataset.read().await.is_some();
    let has_results = state.results.read().await.is_some();
    Html(render_dashboard(has_dataset, has_results))
}

fn model_options() -> String {
    ModelKind::ALL
        .iter()
        .map(|m| format!(r#"<option value="{name}">{name}</option>"#, name = m.display_name()))
        .collect()
}

fn render_dashboard(has_dataset: bool, has_results: bool) -> String {
    let status = if has_results {
        "解析結果があります。チャートを再読み込みできます。"
    } else if has_dataset {
        "データ読み込み済み。解析を実行してください。"
    } else {
        "CSVをアップロードするか、サンプルデータを読み込んでください。"
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>動物病院口コミ感情分析ダッシュボード</title>
    <link rel="stylesheet" href="/static/css/main.css">
    <script src="https://cdn.plot.ly/plotly-2.32.0.min.js"></script>
</head>
<body>
<main class="main-content">
    <div class="page-header">
        <div>
            <h1 class="page-title">動物病院口コミ感情分析</h1>
            <p class="text-muted">3つの日本語BERTモデルの性能を星評価と比較します</p>
        </div>
    </div>

    <div id="alert-area"></div>
    <div id="progress-indicator" class="progress-indicator" style="display:none"></div>
    <p class="text-muted" id="status-line">{status}</p>

    <!-- Data intake -->
    <div class="card">
        <div class="card-header">データ読み込み</div>
        <div class="card-body">
            <input type="file" id="csv-file" accept=".csv">
            <button class="btn btn-primary" id="upload-btn">アップロード</button>
            <button class="btn btn-outline" id="sample-btn">サンプルデータを使用</button>
            <a class="btn btn-outline" href="/download_sample">サンプルCSVをダウンロード</a>
            <p class="text-muted small">必要な列: hospital_id, review_text, star_rating (1-5)</p>
        </div>
    </div>

    <!-- Upload stats -->
    <div class="stats-grid" id="stats-cards" style="display:none">
        <div class="stat-card"><div class="stat-value" id="stat-reviews">-</div><div class="stat-label">口コミ数</div></div>
        <div class="stat-card"><div class="stat-value" id="stat-hospitals">-</div><div class="stat-label">病院数</div></div>
        <div class="stat-card"><div class="stat-value" id="stat-avg">-</div><div class="stat-label">平均星評価</div></div>
    </div>

    <!-- Analysis -->
    <div class="card">
        <div class="card-header">感情分析</div>
        <div class="card-body">
            <button class="btn btn-primary" id="analyze-btn">解析を実行</button>
            <button class="btn btn-outline" id="export-btn">結果をCSVでエクスポート</button>
        </div>
    </div>

    <!-- Charts -->
    <div class="card"><div class="card-header">星評価の分布</div><div id="star-chart" class="chart"></div></div>
    <div class="grid-2">
        <div class="card"><div class="card-header">相関係数 (95%CI)</div><div id="correlation-chart" class="chart"></div></div>
        <div class="card"><div class="card-header">平均絶対誤差 (MAE)</div><div id="mae-chart" class="chart"></div></div>
    </div>
    <div class="card">
        <div class="card-header">モデル別散布図</div>
        <div id="scatter-charts" class="scatter-row"></div>
    </div>

    <!-- Model comparison table -->
    <div class="card">
        <div class="card-header">モデル性能比較</div>
        <div class="table-container"><table class="table" id="comparison-table">
            <thead><tr><th>モデル</th><th>相関係数</th><th>p値</th><th>MAE</th></tr></thead>
            <tbody><tr><td colspan="4" class="text-center text-muted">解析を実行してください</td></tr></tbody>
        </table></div>
    </div>

    <!-- Statistical test -->
    <div class="card">
        <div class="card-header">統計的有意差検定 (ブートストラップ法)</div>
        <div class="card-body">
            <select id="model1-select">{options}</select>
            <select id="model2-select">{options}</select>
            <button class="btn btn-primary" id="test-btn">検定を実行</button>
            <div id="test-result"></div>
        </div>
    </div>
</main>
<script src="/static/js/main.js"></script>
</body>
</html>"#,
        status = status,
        options = model_options(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_lists_every_model_in_the_test_dropdowns() {
        let page = render_dashboard(false, false);
        for model in ModelKind::ALL {
            assert!(page.contains(model.display_name()));
        }
        assert!(page.contains("statistical") || page.contains("test-btn"));
        assert!(page.contains("/static/js/main.js"));
    }
}
