use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricError {
    #[error("reference transcript is empty but hypothesis has {hypothesis_words} words")]
    EmptyReference { hypothesis_words: usize },
}

/// Word-level alignment counts between a reference and a hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WerBreakdown {
    pub hits: usize,
    pub substitutions: usize,
    pub deletions: usize,
    pub insertions: usize,
    pub reference_words: usize,
}

impl WerBreakdown {
    pub fn errors(&self) -> usize {
        self.substitutions + self.deletions + self.insertions
    }

    /// `(S + D + I) / N`. Zero when both transcripts are empty.
    pub fn rate(&self) -> f64 {
        if self.reference_words == 0 {
            return 0.0;
        }
        self.errors() as f64 / self.reference_words as f64
    }
}

/// Lower-case, drop punctuation and collapse whitespace, returning the words.
pub fn normalize_transcript(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Word error rate of `hypothesis` against `reference`.
///
/// Can exceed 1.0 when the hypothesis inserts many words.
pub fn word_error_rate(reference: &str, hypothesis: &str) -> Result<f64, MetricError> {
    word_error_breakdown(reference, hypothesis).map(|b| b.rate())
}

/// Levenshtein alignment over normalized words.
pub fn word_error_breakdown(reference: &str, hypothesis: &str) -> Result<WerBreakdown, MetricError> {
    let reference = normalize_transcript(reference);
    let hypothesis = normalize_transcript(hypothesis);
    if reference.is_empty() && !hypothesis.is_empty() {
        return Err(MetricError::EmptyReference {
            hypothesis_words: hypothesis.len(),
        });
    }

    let n = reference.len();
    let m = hypothesis.len();
    // cost[i][j]: edits turning reference[..i] into hypothesis[..j]
    let mut cost = vec![vec![0usize; m + 1]; n + 1];
    for (i, row) in cost.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=m {
        cost[0][j] = j;
    }
    for i in 1..=n {
        for j in 1..=m {
            let diagonal = cost[i - 1][j - 1] + usize::from(reference[i - 1] != hypothesis[j - 1]);
            cost[i][j] = diagonal.min(cost[i - 1][j] + 1).min(cost[i][j - 1] + 1);
        }
    }

    let mut breakdown = WerBreakdown {
        reference_words: n,
        ..Default::default()
    };
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 {
            let same = reference[i - 1] == hypothesis[j - 1];
            if cost[i][j] == cost[i - 1][j - 1] + usize::from(!same) {
                if same {
                    breakdown.hits += 1;
                } else {
                    breakdown.substitutions += 1;
                }
                i -= 1;
                j -= 1;
                continue;
            }
        }
        if i > 0 && cost[i][j] == cost[i - 1][j] + 1 {
            breakdown.deletions += 1;
            i -= 1;
        } else {
            breakdown.insertions += 1;
            j -= 1;
        }
    }

    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_identical_is_zero() {
        assert_eq!(word_error_rate("the quick brown fox", "the quick brown fox").unwrap(), 0.0);
    }

    #[test]
    fn test_identical_after_normalization_is_zero() {
        let wer = word_error_rate("Hello,   World!", "hello world").unwrap();
        assert_eq!(wer, 0.0);
    }

    #[test]
    fn test_one_insertion_over_three_words() {
        let wer = word_error_rate("a b c", "a b c d").unwrap();
        assert_relative_eq!(wer, 1.0 / 3.0);
    }

    #[rstest]
    #[case::substitution("a b c", "a x c", 1, 0, 0)]
    #[case::deletion("a b c", "a c", 0, 1, 0)]
    #[case::insertion("a b c", "a b c d", 0, 0, 1)]
    #[case::mixed("the cat sat on the mat", "the bat sat the mat now", 1, 1, 1)]
    #[case::all_deleted("one two", "", 0, 2, 0)]
    fn test_breakdown_counts(
        #[case] reference: &str,
        #[case] hypothesis: &str,
        #[case] substitutions: usize,
        #[case] deletions: usize,
        #[case] insertions: usize,
    ) {
        let b = word_error_breakdown(reference, hypothesis).unwrap();
        assert_eq!(b.substitutions, substitutions);
        assert_eq!(b.deletions, deletions);
        assert_eq!(b.insertions, insertions);
        assert_eq!(b.hits + b.substitutions + b.deletions, b.reference_words);
    }

    #[test]
    fn test_heavy_insertion_exceeds_one() {
        let wer = word_error_rate("yes", "no no no").unwrap();
        assert_relative_eq!(wer, 3.0);
    }

    #[test]
    fn test_both_empty_is_zero() {
        assert_eq!(word_error_rate("", "  ...  ").unwrap(), 0.0);
    }

    #[test]
    fn test_empty_reference_with_hypothesis_is_error() {
        assert_eq!(
            word_error_rate("!!", "something here"),
            Err(MetricError::EmptyReference { hypothesis_words: 2 })
        );
    }

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(
            normalize_transcript("  Don't STOP,\tbelieving...  "),
            vec!["dont", "stop", "believing"]
        );
    }
}
