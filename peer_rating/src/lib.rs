/*!
Aggregation of peer-rating matrices.

Every participant rates every other participant and themselves on a scale
from 0 to 10. [compute_ranking] turns that matrix into one score per
participant and ranks them.

```
use peer_rating::*;

let names = vec!["Anna".to_string(), "Bob".to_string()];
let matrix = RatingMatrix::from_scores(&names, &[vec![8.0, 6.0], vec![9.0, 7.0]]);
let results = compute_ranking(&matrix, &AggregationRules::DEFAULT_RULES)?;

assert_eq!(results.len(), 2);
assert_eq!(results[0].rank, 1);
# Ok::<(), ValidationError>(())
```
*/
pub mod builder;
mod config;
pub mod manual;

use log::{debug, info};

use std::collections::HashSet;

pub use crate::config::*;

/// The Elo rating every participant starts with.
pub const INITIAL_ELO: f64 = 1500.0;
/// The adjustment factor when both ratings of a pair agree.
pub const BASE_K_FACTOR: f64 = 32.0;
/// The rating gap for which the expected score is 10 times larger.
pub const ELO_SCALE: f64 = 400.0;
/// How much the self-rating and the others' average can each scale the Elo
/// value (up to 20% each).
pub const BLEND_WEIGHT: f64 = 0.2;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct ParticipantId(usize);

// A matrix that passed all the checks: every cell is a valid score.
#[derive(PartialEq, Debug, Clone)]
struct CheckedMatrix {
    names: Vec<String>,
    scores: Vec<Vec<f64>>,
}

impl CheckedMatrix {
    fn size(&self) -> usize {
        self.names.len()
    }

    fn rating(&self, rater: ParticipantId, ratee: ParticipantId) -> f64 {
        self.scores[rater.0][ratee.0]
    }

    fn self_rating(&self, pid: ParticipantId) -> f64 {
        self.rating(pid, pid)
    }

    fn others_average(&self, pid: ParticipantId) -> f64 {
        // At least one other participant, guaranteed by the checks.
        let received: f64 = (0..self.size())
            .filter(|idx| *idx != pid.0)
            .map(|idx| self.scores[idx][pid.0])
            .sum();
        received / (self.size() - 1) as f64
    }

    fn ids(&self) -> impl Iterator<Item = ParticipantId> {
        (0..self.size()).map(ParticipantId)
    }
}

// The score of a participant before ranking.
#[derive(PartialEq, Debug, Clone)]
struct ScoreInternal {
    pid: ParticipantId,
    self_rating: f64,
    others_average: f64,
    pairwise_elo: Option<f64>,
    score: f64,
    difference: f64,
}

/// Runs the aggregation with the given rules for the given matrix.
///
/// Arguments:
/// * `matrix` the ratings, including the self-ratings on the diagonal
/// * `rules` the rules that govern the scoring
///
/// The results are sorted by rank. Tied participants keep the order in which
/// they appear in the matrix.
pub fn compute_ranking(
    matrix: &RatingMatrix,
    rules: &AggregationRules,
) -> Result<Vec<ParticipantResult>, ValidationError> {
    info!(
        "compute_ranking: Processing {:?} participants, rules: {:?}",
        matrix.participants.len(),
        rules
    );

    check_rules(rules)?;
    let checked = checks(matrix)?;

    let scores: Vec<ScoreInternal> = match rules.scoring_mode {
        ScoringMode::PairwiseElo => {
            let elos = run_elo_pass(&checked, rules.pair_coverage, rules.update_schedule);
            checked
                .ids()
                .map(|pid| {
                    let self_rating = checked.self_rating(pid);
                    let others_average = checked.others_average(pid);
                    let elo = elos[pid.0];
                    let score = blend(elo, self_rating, others_average);
                    ScoreInternal {
                        pid,
                        self_rating,
                        others_average,
                        pairwise_elo: Some(elo),
                        score,
                        difference: score - self_rating,
                    }
                })
                .collect()
        }
        ScoringMode::WeightedAverage => checked
            .ids()
            .map(|pid| {
                let self_rating = checked.self_rating(pid);
                let others_average = checked.others_average(pid);
                let score =
                    rules.self_weight * self_rating + (1.0 - rules.self_weight) * others_average;
                ScoreInternal {
                    pid,
                    self_rating,
                    others_average,
                    pairwise_elo: None,
                    score,
                    difference: self_rating - others_average,
                }
            })
            .collect(),
    };

    let ranks = rank_min(&scores.iter().map(|s| s.score).collect::<Vec<f64>>());

    let mut results: Vec<ParticipantResult> = scores
        .iter()
        .zip(ranks.iter())
        .map(|(s, rank)| ParticipantResult {
            name: checked.names[s.pid.0].clone(),
            self_rating: s.self_rating,
            others_average_rating: s.others_average,
            elo_rating: s.score,
            difference: s.difference,
            rank: *rank,
            pairwise_elo: s.pairwise_elo,
        })
        .collect();
    // Stable sort: ties stay in input order.
    results.sort_by_key(|r| r.rank);

    for r in results.iter() {
        info!(
            "{:>3} {} score: {:.2} (self: {:.2} others: {:.2})",
            r.rank, r.name, r.elo_rating, r.self_rating, r.others_average_rating
        );
    }
    Ok(results)
}

/// Competition ranks ("min" method) of a list of scores, higher is better.
///
/// Equal scores share the rank of the first position of their group and the
/// next distinct score continues after the group: `[10, 10, 8]` gives
/// `[1, 1, 3]`. The ranks are returned in the order of the input.
pub fn rank_min(scores: &[f64]) -> Vec<u32> {
    scores
        .iter()
        .map(|s| {
            let better = scores.iter().filter(|other| *other > s).count();
            (better + 1) as u32
        })
        .collect()
}

fn blend(elo: f64, self_rating: f64, others_average: f64) -> f64 {
    let self_factor = (1.0 - BLEND_WEIGHT) + BLEND_WEIGHT * self_rating / MAX_RATING;
    let others_factor = (1.0 - BLEND_WEIGHT) + BLEND_WEIGHT * others_average / MAX_RATING;
    elo * self_factor * others_factor
}

// The probability that `rater` outperforms `ratee` given the current ratings.
fn expected_score(rater_elo: f64, ratee_elo: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((ratee_elo - rater_elo) / ELO_SCALE))
}

// The K factor grows with the disagreement between the two ratings of a pair.
fn k_factor(given: f64, received: f64) -> f64 {
    BASE_K_FACTOR * (1.0 + (given - received).abs() / MAX_RATING)
}

fn pairs(size: usize, coverage: PairCoverage) -> Vec<(ParticipantId, ParticipantId)> {
    let mut res: Vec<(ParticipantId, ParticipantId)> = Vec::new();
    for rater in 0..size {
        for ratee in 0..size {
            let keep = match coverage {
                PairCoverage::OrderedPairs => rater != ratee,
                PairCoverage::UnorderedPairs => rater < ratee,
            };
            if keep {
                res.push((ParticipantId(rater), ParticipantId(ratee)));
            }
        }
    }
    res
}

/// A single pass of pairwise updates over all the participants.
/// Returns the Elo values indexed by participant.
fn run_elo_pass(
    matrix: &CheckedMatrix,
    coverage: PairCoverage,
    schedule: UpdateSchedule,
) -> Vec<f64> {
    let mut elos: Vec<f64> = vec![INITIAL_ELO; matrix.size()];
    let mut deltas: Vec<f64> = vec![0.0; matrix.size()];

    for (rater, ratee) in pairs(matrix.size(), coverage) {
        let given = matrix.rating(rater, ratee);
        let received = matrix.rating(ratee, rater);
        let k = k_factor(given, received);
        let expected = expected_score(elos[rater.0], elos[ratee.0]);
        let rater_delta = k * (given / MAX_RATING - expected);
        let ratee_delta = k * (received / MAX_RATING - (1.0 - expected));
        debug!(
            "run_elo_pass: {} -> {}: given: {} received: {} k: {} expected: {} deltas: {} {}",
            matrix.names[rater.0],
            matrix.names[ratee.0],
            given,
            received,
            k,
            expected,
            rater_delta,
            ratee_delta
        );
        match schedule {
            UpdateSchedule::Sequential => {
                elos[rater.0] += rater_delta;
                elos[ratee.0] += ratee_delta;
            }
            UpdateSchedule::Simultaneous => {
                deltas[rater.0] += rater_delta;
                deltas[ratee.0] += ratee_delta;
            }
        }
    }

    if schedule == UpdateSchedule::Simultaneous {
        for (elo, delta) in elos.iter_mut().zip(deltas.iter()) {
            *elo += *delta;
        }
    }
    debug!("run_elo_pass: final elos: {:?}", elos);
    elos
}

fn check_rules(rules: &AggregationRules) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&rules.self_weight) {
        return Err(ValidationError::InvalidRules(format!(
            "self weight must be between 0 and 1, got {}",
            rules.self_weight
        )));
    }
    Ok(())
}

// All the cells must be filled with valid scores. Nothing is computed otherwise.
fn checks(matrix: &RatingMatrix) -> Result<CheckedMatrix, ValidationError> {
    let names = &matrix.participants;
    debug!("checks: participants: {:?}", names);
    if names.len() < 2 {
        return Err(ValidationError::TooFewParticipants { count: names.len() });
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for (index, name) in names.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyParticipantName { index });
        }
        if !seen.insert(name.as_str()) {
            return Err(ValidationError::DuplicateParticipant(name.clone()));
        }
    }

    let size = names.len();
    if matrix.ratings.len() != size {
        return Err(ValidationError::MalformedMatrix {
            expected: size,
            found: matrix.ratings.len(),
        });
    }

    let mut scores: Vec<Vec<f64>> = Vec::with_capacity(size);
    for (rater_idx, row) in matrix.ratings.iter().enumerate() {
        if row.len() != size {
            return Err(ValidationError::MalformedMatrix {
                expected: size,
                found: row.len(),
            });
        }
        let mut checked_row: Vec<f64> = Vec::with_capacity(size);
        for (ratee_idx, cell) in row.iter().enumerate() {
            let rater = || names[rater_idx].clone();
            let ratee = || names[ratee_idx].clone();
            let score = match cell {
                RatingCell::Score(x) if x.is_nan() => {
                    return Err(ValidationError::UnreadableRating {
                        rater: rater(),
                        ratee: ratee(),
                        content: format!("{}", x),
                    });
                }
                RatingCell::Score(x) if !(MIN_RATING..=MAX_RATING).contains(x) => {
                    return Err(ValidationError::OutOfRange {
                        rater: rater(),
                        ratee: ratee(),
                        value: *x,
                    });
                }
                RatingCell::Score(x) => *x,
                RatingCell::Blank => {
                    return Err(ValidationError::MissingRating {
                        rater: rater(),
                        ratee: ratee(),
                    });
                }
                RatingCell::Unreadable(content) => {
                    return Err(ValidationError::UnreadableRating {
                        rater: rater(),
                        ratee: ratee(),
                        content: content.clone(),
                    });
                }
            };
            checked_row.push(score);
        }
        scores.push(checked_row);
    }

    Ok(CheckedMatrix {
        names: names.clone(),
        scores,
    })
}
