pub use crate::config::*;

use log::debug;

/// A builder for entering ratings one rater at a time.
///
/// This is the manual-entry path: participants are declared first, then every
/// rater fills in a row. The builder can suggest which rater should go next.
///
/// ```
/// pub use peer_rating::builder::Builder;
/// pub use peer_rating::AggregationRules;
/// # use peer_rating::ValidationError;
///
/// let mut builder = Builder::new(&AggregationRules::DEFAULT_RULES)?
///     .participants(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder.add_rating("Anna", "Anna", 8.0)?;
/// builder.add_rating("Anna", "Bob", 6.0)?;
/// assert_eq!(builder.pending_raters(), vec!["Bob".to_string()]);
///
/// builder.add_rating("Bob", "Anna", 9.0)?;
/// builder.add_rating("Bob", "Bob", 7.0)?;
/// let results = builder.compute()?;
/// assert_eq!(results.len(), 2);
///
/// # Ok::<(), ValidationError>(())
/// ```
pub struct Builder {
    pub(crate) _rules: AggregationRules,
    pub(crate) _participants: Vec<String>,
    pub(crate) _ratings: Vec<Vec<RatingCell>>,
}

impl Builder {
    pub fn new(rules: &AggregationRules) -> Result<Builder, ValidationError> {
        Ok(Builder {
            _rules: rules.clone(),
            _participants: Vec::new(),
            _ratings: Vec::new(),
        })
    }

    /// Declares the participants, in order. All the ratings entered so far are
    /// discarded.
    pub fn participants(self, names: &[String]) -> Result<Builder, ValidationError> {
        for (idx, name) in names.iter().enumerate() {
            if names[..idx].contains(name) {
                return Err(ValidationError::DuplicateParticipant(name.clone()));
            }
        }
        Ok(Builder {
            _rules: self._rules,
            _participants: names.to_vec(),
            _ratings: vec![vec![RatingCell::Blank; names.len()]; names.len()],
        })
    }

    /// Records how `rater` rated `ratee`. Use the same name twice for a
    /// self-rating. A previous value for the same pair is replaced.
    pub fn add_rating(&mut self, rater: &str, ratee: &str, value: f64) -> Result<(), ValidationError> {
        self.add_cell(rater, ratee, RatingCell::Score(value))
    }

    pub fn add_cell(
        &mut self,
        rater: &str,
        ratee: &str,
        cell: RatingCell,
    ) -> Result<(), ValidationError> {
        let rater_idx = self.index_of(rater)?;
        let ratee_idx = self.index_of(ratee)?;
        debug!("add_cell: {} -> {}: {:?}", rater, ratee, cell);
        self._ratings[rater_idx][ratee_idx] = cell;
        Ok(())
    }

    /// Records a full row for a rater. The cells follow the order of the
    /// declared participants.
    pub fn add_row(&mut self, rater: &str, cells: &[RatingCell]) -> Result<(), ValidationError> {
        let rater_idx = self.index_of(rater)?;
        if cells.len() != self._participants.len() {
            return Err(ValidationError::MalformedMatrix {
                expected: self._participants.len(),
                found: cells.len(),
            });
        }
        self._ratings[rater_idx] = cells.to_vec();
        Ok(())
    }

    /// The raters that still have blank cells in their row, in participant order.
    pub fn pending_raters(&self) -> Vec<String> {
        self._participants
            .iter()
            .zip(self._ratings.iter())
            .filter(|(_, row)| row.iter().any(|c| *c == RatingCell::Blank))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Suggests the next rater among the pending ones.
    ///
    /// The choice is hard to guess in advance but fully determined by the seed
    /// and the names: the pending rater with the smallest SHA-256 digest of
    /// the seed and name goes first. Returns None once every row is complete.
    pub fn next_rater(&self, seed: u32) -> Option<String> {
        let mut pending: Vec<(String, String)> = self
            .pending_raters()
            .into_iter()
            .map(|name| (sha256::digest(format!("{:08}{}", seed, name).as_str()), name))
            .collect();
        pending.sort();
        debug!("next_rater: seed: {} order: {:?}", seed, pending);
        pending.into_iter().next().map(|(_, name)| name)
    }

    /// The matrix entered so far, blanks included.
    pub fn matrix(&self) -> RatingMatrix {
        RatingMatrix {
            participants: self._participants.clone(),
            ratings: self._ratings.clone(),
        }
    }

    pub fn compute(&self) -> Result<Vec<ParticipantResult>, ValidationError> {
        crate::compute_ranking(&self.matrix(), &self._rules)
    }

    fn index_of(&self, name: &str) -> Result<usize, ValidationError> {
        self._participants
            .iter()
            .position(|p| p == name)
            .ok_or_else(|| ValidationError::UnknownParticipant(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team() -> Vec<String> {
        vec!["Asha".to_string(), "Ben".to_string(), "Chloe".to_string()]
    }

    #[test]
    fn rejects_duplicate_participants() {
        let res = Builder::new(&AggregationRules::DEFAULT_RULES)
            .unwrap()
            .participants(&["Asha".to_string(), "Asha".to_string()]);
        assert!(matches!(
            res,
            Err(ValidationError::DuplicateParticipant(n)) if n == "Asha"
        ));
    }

    #[test]
    fn rejects_unknown_names_and_short_rows() {
        let mut b = Builder::new(&AggregationRules::DEFAULT_RULES)
            .unwrap()
            .participants(&team())
            .unwrap();
        assert_eq!(
            b.add_rating("Zoe", "Ben", 5.0),
            Err(ValidationError::UnknownParticipant("Zoe".to_string()))
        );
        assert_eq!(
            b.add_row("Ben", &[RatingCell::Score(5.0)]),
            Err(ValidationError::MalformedMatrix {
                expected: 3,
                found: 1
            })
        );
    }

    #[test]
    fn incomplete_entry_cannot_be_ranked() {
        let mut b = Builder::new(&AggregationRules::DEFAULT_RULES)
            .unwrap()
            .participants(&team())
            .unwrap();
        b.add_row("Asha", &vec![RatingCell::Score(8.0); 3]).unwrap();
        assert!(matches!(
            b.compute(),
            Err(ValidationError::MissingRating { .. })
        ));
        assert_eq!(b.pending_raters(), vec!["Ben".to_string(), "Chloe".to_string()]);
    }

    #[test]
    fn next_rater_walks_through_everyone() {
        let mut b = Builder::new(&AggregationRules::DEFAULT_RULES)
            .unwrap()
            .participants(&team())
            .unwrap();
        let mut seen: Vec<String> = Vec::new();
        while let Some(rater) = b.next_rater(42) {
            assert!(!seen.contains(&rater));
            // Same question, same answer.
            assert_eq!(b.next_rater(42), Some(rater.clone()));
            b.add_row(&rater, &vec![RatingCell::Score(7.0); 3]).unwrap();
            seen.push(rater);
        }
        seen.sort();
        assert_eq!(seen, team());
        assert!(b.pending_raters().is_empty());

        let results = b.compute().unwrap();
        assert!(results.iter().all(|r| r.rank == 1));
    }

    #[test]
    fn matrix_keeps_entered_cells() {
        let mut b = Builder::new(&AggregationRules::DEFAULT_RULES)
            .unwrap()
            .participants(&team())
            .unwrap();
        b.add_rating("Ben", "Chloe", 6.5).unwrap();
        b.add_cell("Chloe", "Ben", RatingCell::Unreadable("n/a".to_string()))
            .unwrap();
        let m = b.matrix();
        assert_eq!(m.participants, team());
        assert_eq!(m.ratings[1][2], RatingCell::Score(6.5));
        assert_eq!(m.ratings[2][1], RatingCell::Unreadable("n/a".to_string()));
        assert_eq!(m.ratings[0][0], RatingCell::Blank);
    }
}
