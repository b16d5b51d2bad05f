use std::collections::HashMap;

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::embedding::{cosine_similarity, Embedding, EmbeddingError};
use crate::storage::EnrollmentRecord;

/// Acceptance threshold can never be configured below this. Security
/// invariant; changing it requires sign-off.
pub const THRESHOLD_FLOOR: f32 = 0.90;

/// Employees scoring within this window below the configured threshold are
/// considered close enough to take part in the ambiguity check.
pub const CLOSE_MATCH_WINDOW: f32 = 0.05;

/// Minimum separation between the top two distinct employees; any less and
/// the attempt is rejected as ambiguous.
pub const AMBIGUITY_GAP: f32 = 0.03;

#[derive(Debug, Error)]
pub enum MatchError {
    /// Candidate embedding cannot be compared at all; the attempt is aborted.
    #[error("invalid embedding: zero magnitude")]
    InvalidEmbedding,
}

/// Outcome of one recognition attempt. Transient; recomputed per attempt,
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_id: Option<String>,
    pub similarity: f32,
    pub ambiguous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MatchResult {
    fn rejected(similarity: f32, ambiguous: bool, message: String) -> Self {
        Self {
            matched: false,
            employee_id: None,
            employee_name: None,
            enrollment_id: None,
            similarity,
            ambiguous,
            message: Some(message),
        }
    }
}

/// Find the enrolled employee best matching `candidate`, or reject.
///
/// Single linear pass over the pool tracking the global best under strict
/// `>`, so ties resolve to the first-seen record; per-record failures
/// (dimension mismatch, zero-magnitude stored vector) are logged and skipped,
/// never fatal to the scan. A zero-magnitude candidate aborts the whole
/// attempt since there is nothing to compare.
///
/// Deterministic for a fixed candidate and pool; no shared state, safe to run
/// concurrently on independent pool snapshots.
pub fn find_best_match(
    candidate: &Embedding,
    pool: &[EnrollmentRecord],
    threshold: f32,
) -> Result<MatchResult, MatchError> {
    let candidate = candidate
        .normalize()
        .map_err(|_: EmbeddingError| MatchError::InvalidEmbedding)?;

    if pool.is_empty() {
        return Ok(MatchResult::rejected(
            -1.0,
            false,
            "No biometrics enrolled.".to_string(),
        ));
    }

    let mut best_similarity = -1.0f32;
    let mut best: Option<&EnrollmentRecord> = None;
    let mut similarities: Vec<(&str, &str, f32)> = Vec::with_capacity(pool.len());

    for record in pool {
        if record.embedding.len() != candidate.len() {
            warn!(
                "skipping enrollment {}: dimension mismatch ({} vs {})",
                record.id,
                record.embedding.len(),
                candidate.len()
            );
            continue;
        }

        let stored = match Embedding::from_vec(record.embedding.clone()).normalize() {
            Ok(s) => s,
            Err(e) => {
                warn!("skipping enrollment {}: {}", record.id, e);
                continue;
            }
        };

        let similarity = match cosine_similarity(&candidate, &stored) {
            Ok(s) => s,
            Err(e) => {
                warn!("skipping enrollment {}: {}", record.id, e);
                continue;
            }
        };

        similarities.push((&record.employee_id, &record.employee_name, similarity));

        if similarity > best_similarity {
            best_similarity = similarity;
            best = Some(record);
        }
    }

    // Ambiguity is judged per distinct employee: several enrollment photos of
    // the same person scoring close together are expected and must not
    // trigger it, only cross-employee closeness does.
    let mut best_per_employee: HashMap<&str, (&str, f32)> = HashMap::new();
    for &(employee_id, name, similarity) in &similarities {
        match best_per_employee.get(employee_id) {
            Some(&(_, current)) if similarity <= current => {}
            _ => {
                best_per_employee.insert(employee_id, (name, similarity));
            }
        }
    }

    let mut close: Vec<(&str, f32)> = best_per_employee
        .values()
        .filter(|&&(_, s)| s >= threshold - CLOSE_MATCH_WINDOW)
        .copied()
        .collect();
    close.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    if close.len() > 1 && close[0].1 - close[1].1 < AMBIGUITY_GAP {
        warn!(
            "ambiguous recognition: {} ({:.3}) vs {} ({:.3})",
            close[0].0, close[0].1, close[1].0, close[1].1
        );
        return Ok(MatchResult::rejected(
            best_similarity,
            true,
            "Ambiguous recognition: multiple employees with close similarity. Contact HR."
                .to_string(),
        ));
    }

    let minimum_threshold = threshold.max(THRESHOLD_FLOOR);

    match best {
        Some(record) if best_similarity >= minimum_threshold => {
            info!(
                "recognized {} ({}) at similarity {:.3} (minimum {:.3})",
                record.employee_name, record.employee_id, best_similarity, minimum_threshold
            );
            Ok(MatchResult {
                matched: true,
                employee_id: Some(record.employee_id.clone()),
                employee_name: Some(record.employee_name.clone()),
                enrollment_id: Some(record.id.clone()),
                similarity: best_similarity,
                ambiguous: false,
                message: None,
            })
        }
        _ => {
            warn!(
                "recognition rejected: best similarity {:.3} below minimum {:.3}",
                best_similarity, minimum_threshold
            );
            Ok(MatchResult::rejected(
                best_similarity,
                false,
                rejection_message(best_similarity, minimum_threshold),
            ))
        }
    }
}

/// Operator-facing rejection text, tiered by similarity band. Never carries
/// internal error detail.
fn rejection_message(similarity: f32, minimum_threshold: f32) -> String {
    if similarity < 0.0 {
        "No face compared. Move closer to the camera and check the lighting.".to_string()
    } else if similarity < 0.5 {
        "Face not recognized. Check that you are enrolled or contact HR.".to_string()
    } else if similarity < 0.7 {
        format!(
            "Face not recognized. Similarity too low ({:.1}%). Check that you are enrolled.",
            similarity * 100.0
        )
    } else {
        format!(
            "Face not recognized. Similarity {:.1}% (minimum required {:.1}%). Contact HR to re-enroll your biometrics.",
            similarity * 100.0,
            minimum_threshold * 100.0
        )
    }
}
