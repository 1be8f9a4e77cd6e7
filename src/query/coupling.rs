//! Coupling query.

use super::Corpus;
use crate::types::FileId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    High,
    Medium,
    Loose,
}

impl Strength {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Loose => "loose",
        }
    }

    fn from_count(count: u32) -> Self {
        if count >= 10 {
            Self::High
        } else if count >= 3 {
            Self::Medium
        } else {
            Self::Loose
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoupledFile {
    pub other_file_id: FileId,
    pub cochange_count: u32,
    pub strength: Strength,
}

/// `git_cochange` pairs involving `file_id`, sorted by `cochange_count`
/// descending, optionally filtered by a minimum strength.
pub fn run(corpus: &Corpus, file_id: FileId, min_strength: Option<Strength>) -> Vec<CoupledFile> {
    let mut results: Vec<CoupledFile> = corpus
        .git_cochange
        .iter()
        .filter_map(|pair| {
            let other = if pair.file_id_a == file_id {
                Some(pair.file_id_b)
            } else if pair.file_id_b == file_id {
                Some(pair.file_id_a)
            } else {
                None
            }?;
            let strength = Strength::from_count(pair.cochange_count);
            Some(CoupledFile { other_file_id: other, cochange_count: pair.cochange_count, strength })
        })
        .filter(|c| match min_strength {
            Some(Strength::High) => matches!(c.strength, Strength::High),
            Some(Strength::Medium) => matches!(c.strength, Strength::High | Strength::Medium),
            _ => true,
        })
        .collect();

    results.sort_by(|a, b| b.cochange_count.cmp(&a.cochange_count));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GitCochange;

    fn fid(n: u64) -> FileId {
        FileId::new(n).unwrap()
    }

    #[test]
    fn test_sorted_descending_and_bucketed() {
        let mut corpus = super::super::tests_support::empty_corpus();
        corpus.git_cochange = vec![
            GitCochange::new(fid(1), fid(2), 2),
            GitCochange::new(fid(1), fid(3), 12),
            GitCochange::new(fid(1), fid(4), 5),
        ];
        let result = run(&corpus, fid(1), None);
        assert_eq!(result[0].other_file_id, fid(3));
        assert_eq!(result[0].strength, Strength::High);
        assert_eq!(result[1].strength, Strength::Medium);
        assert_eq!(result[2].strength, Strength::Loose);
    }

    #[test]
    fn test_min_strength_filters() {
        let mut corpus = super::super::tests_support::empty_corpus();
        corpus.git_cochange = vec![GitCochange::new(fid(1), fid(2), 2), GitCochange::new(fid(1), fid(3), 12)];
        let result = run(&corpus, fid(1), Some(Strength::High));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].other_file_id, fid(3));
    }
}
