use ndarray::Array1;
use thiserror::Error;

/// Face embedding vector. Dimensionality is fixed per capture model
/// (128-512 in practice); immutable once captured.
#[derive(Debug, Clone)]
pub struct Embedding {
    pub vector: Array1<f32>,
}

#[derive(Debug, Error, PartialEq)]
pub enum EmbeddingError {
    #[error("embedding vector has zero magnitude")]
    ZeroMagnitude,
    #[error("embedding vectors must have the same length ({left} vs {right})")]
    DimensionMismatch { left: usize, right: usize },
    #[error("embedding must be an array of numbers")]
    NotAnArray,
    #[error("embedding contains a non-finite value")]
    NotFinite,
}

impl Embedding {
    pub fn from_vec(values: Vec<f32>) -> Self {
        Self {
            vector: Array1::from_vec(values),
        }
    }

    /// Parse an embedding from a JSON payload (array of numbers).
    /// NaN and infinite components are rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, EmbeddingError> {
        let items = value.as_array().ok_or(EmbeddingError::NotAnArray)?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let n = item.as_f64().ok_or(EmbeddingError::NotAnArray)? as f32;
            if !n.is_finite() {
                return Err(EmbeddingError::NotFinite);
            }
            out.push(n);
        }
        Ok(Self::from_vec(out))
    }

    pub fn len(&self) -> usize {
        self.vector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }

    pub fn magnitude(&self) -> f32 {
        self.vector.dot(&self.vector).sqrt()
    }

    /// Scale to unit magnitude so similarity comparisons are consistent.
    /// A zero vector cannot be normalized and is rejected, never zero-filled.
    pub fn normalize(&self) -> Result<Embedding, EmbeddingError> {
        let magnitude = self.magnitude();
        if magnitude == 0.0 {
            return Err(EmbeddingError::ZeroMagnitude);
        }
        Ok(Embedding {
            vector: &self.vector / magnitude,
        })
    }
}

/// Cosine similarity between two embeddings, in [-1, 1].
///
/// When both inputs are already unit-normalized the dot product *is* the
/// cosine, so it is clamped and returned directly; the raw dot product can
/// drift just past 1.0 through floating error. A zero-magnitude input yields
/// 0.0 rather than an error, which is only reachable when an un-normalized
/// zero vector is compared directly.
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> Result<f32, EmbeddingError> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot = a.vector.dot(&b.vector);
    let mag_a_sq = a.vector.dot(&a.vector);
    let mag_b_sq = b.vector.dot(&b.vector);

    if mag_a_sq == 0.0 || mag_b_sq == 0.0 {
        return Ok(0.0);
    }

    let normalized = (mag_a_sq - 1.0).abs() < 0.01 && (mag_b_sq - 1.0).abs() < 0.01;
    if normalized {
        return Ok(dot.clamp(-1.0, 1.0));
    }

    Ok(dot / (mag_a_sq.sqrt() * mag_b_sq.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_yields_unit_magnitude() {
        let e = Embedding::from_vec(vec![3.0, 4.0]);
        let unit = e.normalize().unwrap();
        assert!((unit.magnitude() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_rejects_zero_vector() {
        let e = Embedding::from_vec(vec![0.0; 128]);
        assert_eq!(e.normalize().unwrap_err(), EmbeddingError::ZeroMagnitude);
    }

    #[test]
    fn self_similarity_is_one() {
        let e = Embedding::from_vec(vec![0.2, -0.7, 1.3, 0.05])
            .normalize()
            .unwrap();
        let sim = cosine_similarity(&e, &e).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mismatched_lengths_fail() {
        let a = Embedding::from_vec(vec![1.0, 0.0]);
        let b = Embedding::from_vec(vec![1.0, 0.0, 0.0]);
        assert_eq!(
            cosine_similarity(&a, &b).unwrap_err(),
            EmbeddingError::DimensionMismatch { left: 2, right: 3 }
        );
    }

    #[test]
    fn zero_vector_similarity_is_zero() {
        let a = Embedding::from_vec(vec![0.0, 0.0]);
        let b = Embedding::from_vec(vec![1.0, 0.0]);
        assert_eq!(cosine_similarity(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn unnormalized_inputs_use_full_cosine() {
        // Same direction, different magnitudes: cosine is still 1.
        let a = Embedding::from_vec(vec![2.0, 0.0]);
        let b = Embedding::from_vec(vec![5.0, 0.0]);
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_score_minus_one() {
        let a = Embedding::from_vec(vec![1.0, 0.0]);
        let b = Embedding::from_vec(vec![-1.0, 0.0]);
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn from_json_parses_numbers() {
        let v: serde_json::Value = serde_json::json!([0.1, -0.5, 2]);
        let e = Embedding::from_json(&v).unwrap();
        assert_eq!(e.len(), 3);
        assert!((e.vector[2] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn from_json_rejects_non_arrays_and_non_numbers() {
        assert_eq!(
            Embedding::from_json(&serde_json::json!("nope")).unwrap_err(),
            EmbeddingError::NotAnArray
        );
        assert_eq!(
            Embedding::from_json(&serde_json::json!([0.1, "x"])).unwrap_err(),
            EmbeddingError::NotAnArray
        );
    }
}
