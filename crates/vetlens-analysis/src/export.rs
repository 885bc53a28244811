//! CSV export of the per-hospital aggregate table.

use vetlens_common::{ModelKind, Result, VetlensError};

use crate::results::AnalysisResults;

/// Render the hospital-level table as CSV, one row per hospital, one
/// score column per model. Matches the table `/get_charts` plots.
pub fn results_csv(results: &AnalysisResults) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["hospital_id".to_string(), "review_count".to_string(), "star_score".to_string()];
    header.extend(ModelKind::ALL.iter().map(|m| format!("{}_score", m.display_name())));
    writer.write_record(&header).map_err(|e| VetlensError::Csv(e.to_string()))?;

    for hospital in &results.hospitals {
        let mut row = vec![
            hospital.hospital_id.clone(),
            hospital.review_count.to_string(),
            format!("{:.6}", hospital.star_score),
        ];
        row.extend(
            ModelKind::ALL
                .iter()
                .map(|m| format!("{:.6}", hospital.model_scores[m])),
        );
        writer.write_record(&row).map_err(|e| VetlensError::Csv(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| VetlensError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| VetlensError::Csv(e.to_string()))
}
