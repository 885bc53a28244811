//! Uploaded CSV validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use vetlens_common::{ReviewRecord, Result, VetlensError};

pub const REQUIRED_COLUMNS: [&str; 3] = ["hospital_id", "review_text", "star_rating"];

/// Upper bound on rows processed per upload.
pub const MAX_ROWS: usize = 10_000;

/// A validated batch of reviews, plus how many source rows were dropped
/// for bad ratings. Bad rows are skipped, not fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub records: Vec<ReviewRecord>,
    pub dropped_rows: usize,
}

/// Summary returned from `/upload` and `/load_sample`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_reviews: usize,
    pub unique_hospitals: usize,
    pub avg_star_rating: f64,
    pub star_distribution: BTreeMap<u8, usize>,
}

impl Dataset {
    /// Parse and validate raw CSV bytes (UTF-8, header row required).
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Dataset> {
        // Tolerate a UTF-8 BOM from spreadsheet exports.
        let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
        let text = std::str::from_utf8(bytes)
            .map_err(|_| VetlensError::InvalidInput("file is not valid UTF-8".to_string()))?;

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| VetlensError::Csv(e.to_string()))?
            .clone();

        let column_index = |name: &str| headers.iter().position(|h| h.trim() == name);
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| column_index(c).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(VetlensError::InvalidInput(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }
        let hospital_idx = column_index("hospital_id").unwrap();
        let text_idx = column_index("review_text").unwrap();
        let rating_idx = column_index("star_rating").unwrap();

        let mut records = Vec::new();
        let mut dropped = 0usize;
        for row in reader.records() {
            let row = row.map_err(|e| VetlensError::Csv(e.to_string()))?;
            if records.len() + dropped >= MAX_ROWS {
                return Err(VetlensError::InvalidInput(format!(
                    "at most {MAX_ROWS} reviews can be processed per upload"
                )));
            }

            let hospital_id = row.get(hospital_idx).unwrap_or("").trim().to_string();
            let review_text = row.get(text_idx).unwrap_or("").to_string();
            match parse_rating(row.get(rating_idx).unwrap_or("")) {
                Some(star_rating) if !hospital_id.is_empty() => {
                    records.push(ReviewRecord { hospital_id, review_text, star_rating });
                }
                _ => dropped += 1,
            }
        }

        Self::from_parts(records, dropped)
    }

    /// Validate rows the frontend sends back inline to `/analyze`.
    pub fn from_records(records: Vec<ReviewRecord>) -> Result<Dataset> {
        let mut kept = Vec::with_capacity(records.len());
        let mut dropped = 0usize;
        for rec in records {
            if (1..=5).contains(&rec.star_rating) && !rec.hospital_id.is_empty() {
                kept.push(rec);
            } else {
                dropped += 1;
            }
        }
        Self::from_parts(kept, dropped)
    }

    fn from_parts(records: Vec<ReviewRecord>, dropped_rows: usize) -> Result<Dataset> {
        if records.is_empty() {
            return Err(VetlensError::InvalidInput(
                "no valid reviews found (ratings must be integers 1-5)".to_string(),
            ));
        }
        if records.len() > MAX_ROWS {
            return Err(VetlensError::InvalidInput(format!(
                "at most {MAX_ROWS} reviews can be processed per upload"
            )));
        }

        let dataset = Dataset { records, dropped_rows };
        let stats = dataset.stats();
        info!(
            total = stats.total_reviews,
            hospitals = stats.unique_hospitals,
            avg = format!("{:.2}", stats.avg_star_rating),
            dropped = dataset.dropped_rows,
            "Dataset validated"
        );
        Ok(dataset)
    }

    pub fn stats(&self) -> DatasetStats {
        let mut star_distribution = BTreeMap::new();
        let mut hospitals = std::collections::BTreeSet::new();
        let mut rating_sum = 0u64;
        for rec in &self.records {
            *star_distribution.entry(rec.star_rating).or_insert(0) += 1;
            hospitals.insert(rec.hospital_id.as_str());
            rating_sum += rec.star_rating as u64;
        }
        DatasetStats {
            total_reviews: self.records.len(),
            unique_hospitals: hospitals.len(),
            avg_star_rating: rating_sum as f64 / self.records.len() as f64,
            star_distribution,
        }
    }
}

/// Ratings arrive as "4", "4.0", sometimes padded. Fractional values are
/// truncated; anything non-numeric or outside 1..=5 drops the row.
fn parse_rating(raw: &str) -> Option<u8> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let truncated = value.trunc() as i64;
    (1..=5).contains(&truncated).then_some(truncated as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "hospital_id,review_text,star_rating\n\
        h1,とても良い病院です,5\n\
        h1,待ち時間が長い,2\n\
        h2,普通でした,3\n";

    #[test]
    fn parses_well_formed_csv() {
        let ds = Dataset::from_csv_bytes(SAMPLE.as_bytes()).unwrap();
        let stats = ds.stats();
        assert_eq!(stats.total_reviews, 3);
        assert_eq!(stats.unique_hospitals, 2);
        assert!((stats.avg_star_rating - 10.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.star_distribution.get(&5), Some(&1));
    }

    #[test]
    fn rejects_missing_columns() {
        let err = Dataset::from_csv_bytes(b"hospital_id,rating\nh1,5\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("review_text"), "{msg}");
        assert!(msg.contains("star_rating"), "{msg}");
    }

    #[test]
    fn drops_bad_ratings_but_keeps_good_rows() {
        let csv = "hospital_id,review_text,star_rating\n\
            h1,ok,5\nh1,bad,abc\nh1,zero,0\nh1,six,6\nh1,frac,4.7\n";
        let ds = Dataset::from_csv_bytes(csv.as_bytes()).unwrap();
        assert_eq!(ds.records.len(), 2); // "ok" and "frac" (4.7 → 4)
        assert_eq!(ds.dropped_rows, 3);
        assert_eq!(ds.records[1].star_rating, 4);
    }

    #[test]
    fn rejects_empty_and_all_invalid() {
        assert!(Dataset::from_csv_bytes(b"hospital_id,review_text,star_rating\n").is_err());
        assert!(
            Dataset::from_csv_bytes(b"hospital_id,review_text,star_rating\nh1,x,9\n").is_err()
        );
    }

    #[test]
    fn rejects_non_utf8() {
        let mut bytes = b"hospital_id,review_text,star_rating\nh1,".to_vec();
        bytes.extend_from_slice(&[0x93, 0xae, 0x95, 0xa8]); // Shift-JIS 動物
        bytes.extend_from_slice(b",5\n");
        let err = Dataset::from_csv_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn strips_bom_and_extra_columns_are_fine() {
        let csv = "\u{feff}extra,hospital_id,review_text,star_rating\nx,h1,text,4\n";
        let ds = Dataset::from_csv_bytes(csv.as_bytes()).unwrap();
        assert_eq!(ds.records[0].hospital_id, "h1");
        assert_eq!(ds.records[0].star_rating, 4);
    }

    #[test]
    fn rejects_uploads_over_the_row_cap() {
        let mut csv = String::from("hospital_id,review_text,star_rating\n");
        for i in 0..=MAX_ROWS {
            csv.push_str(&format!("h{},口コミ,3\n", i % 50));
        }
        let err = Dataset::from_csv_bytes(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains(&MAX_ROWS.to_string()), "{err}");
    }

    #[test]
    fn row_cap_is_inclusive() {
        let record = |i: usize| ReviewRecord {
            hospital_id: format!("h{}", i % 50),
            review_text: "口コミ".to_string(),
            star_rating: 3,
        };
        let ds = Dataset::from_records((0..MAX_ROWS).map(record).collect()).unwrap();
        assert_eq!(ds.records.len(), MAX_ROWS);

        let err = Dataset::from_records((0..=MAX_ROWS).map(record).collect()).unwrap_err();
        assert!(err.to_string().contains(&MAX_ROWS.to_string()), "{err}");
    }

    #[test]
    fn from_records_filters_out_of_range() {
        let recs = vec![
            ReviewRecord { hospital_id: "h1".into(), review_text: "a".into(), star_rating: 3 },
            ReviewRecord { hospital_id: "".into(), review_text: "b".into(), star_rating: 3 },
            ReviewRecord { hospital_id: "h1".into(), review_text: "c".into(), star_rating: 0 },
        ];
        let ds = Dataset::from_records(recs).unwrap();
        assert_eq!(ds.records.len(), 1);
        assert_eq!(ds.dropped_rows, 2);
    }
}
