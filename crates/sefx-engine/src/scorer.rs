//! Weighted aggregation of term/comment similarities into relevance scores.

use crate::similarity::SimilarityMatrix;
use crate::types::ExpansionEntry;

/// Relevance of a seed keyword to a drug's whole comment set.
///
/// For every expansion term with weight `w` and similarity row `s` over `n`
/// comments, adds `Σ(w·sᵢ) / n`. Returns `0.0` for an empty comment set or
/// an empty expansion. Terms missing from the matrix contribute nothing.
#[must_use]
pub fn aggregate_score(entries: &[ExpansionEntry], matrix: &SimilarityMatrix) -> f64 {
    let n = matrix.comment_count();
    if n == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let denom = n as f64;

    entries
        .iter()
        .filter_map(|entry| {
            let row = matrix.row(&entry.term)?;
            let weight = f64::from(entry.weight);
            let sum: f64 = row.iter().map(|&s| weight * f64::from(s)).sum();
            Some(sum / denom)
        })
        .sum()
}

/// Per-comment relevance of a seed keyword.
///
/// `scoresᵢ = Σ_term w_term · s_term,ᵢ`, one value per comment, not divided
/// by the comment count.
#[must_use]
pub fn per_comment_scores(entries: &[ExpansionEntry], matrix: &SimilarityMatrix) -> Vec<f64> {
    let mut scores = vec![0.0_f64; matrix.comment_count()];

    for entry in entries {
        let Some(row) = matrix.row(&entry.term) else {
            continue;
        };
        let weight = f64::from(entry.weight);
        for (score, &s) in scores.iter_mut().zip(row) {
            *score += weight * f64::from(s);
        }
    }

    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::SimilarityRow;

    fn entry(term: &str, weight: f32) -> ExpansionEntry {
        ExpansionEntry {
            term: term.to_string(),
            weight,
        }
    }

    fn matrix(rows: &[(&str, &[f32])], n: usize) -> SimilarityMatrix {
        SimilarityMatrix::from_rows(
            rows.iter()
                .map(|(term, values)| SimilarityRow {
                    term: (*term).to_string(),
                    values: values.to_vec(),
                })
                .collect(),
            n,
        )
        .unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn single_term_aggregate_is_weighted_mean() {
        let m = matrix(&[("nausea", &[0.8, 0.9, 0.7])], 3);
        let score = aggregate_score(&[entry("nausea", 1.0)], &m);
        assert!(approx(score, 0.8), "got {score}");
    }

    #[test]
    fn aggregate_sums_over_terms() {
        let m = matrix(&[("nausea", &[1.0, 0.0]), ("sickness", &[0.5, 0.5])], 2);
        let entries = [entry("nausea", 1.0), entry("sickness", 0.5)];
        // nausea: (1.0 + 0.0) / 2 = 0.5; sickness: 0.5 * (0.5 + 0.5) / 2 = 0.25
        assert!(approx(aggregate_score(&entries, &m), 0.75));
    }

    #[test]
    fn per_comment_scores_are_not_divided() {
        let m = matrix(&[("nausea", &[1.0, 0.0]), ("sickness", &[0.5, 0.5])], 2);
        let entries = [entry("nausea", 1.0), entry("sickness", 0.5)];
        let scores = per_comment_scores(&entries, &m);
        assert_eq!(scores.len(), 2);
        assert!(approx(scores[0], 1.25));
        assert!(approx(scores[1], 0.25));
    }

    #[test]
    fn empty_expansion_scores_zero() {
        let m = matrix(&[], 3);
        assert_eq!(aggregate_score(&[], &m), 0.0);
        assert_eq!(per_comment_scores(&[], &m), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn empty_comment_set_scores_zero() {
        let m = matrix(&[("nausea", &[])], 0);
        assert_eq!(aggregate_score(&[entry("nausea", 1.0)], &m), 0.0);
        assert!(per_comment_scores(&[entry("nausea", 1.0)], &m).is_empty());
    }

    #[test]
    fn terms_missing_from_matrix_are_ignored() {
        let m = matrix(&[("nausea", &[0.5])], 1);
        let entries = [entry("nausea", 1.0), entry("vomiting", 0.9)];
        assert!(approx(aggregate_score(&entries, &m), 0.5));
        assert!(approx(per_comment_scores(&entries, &m)[0], 0.5));
    }
}
