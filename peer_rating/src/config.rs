// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The lowest rating a participant can give.
pub const MIN_RATING: f64 = 0.0;
/// The highest rating a participant can give.
pub const MAX_RATING: f64 = 10.0;

/// All the possible states of a cell in a rating matrix.
///
/// Readers do not need to decide whether a cell is acceptable: they report
/// what they saw and the aggregation rejects the matrix if needed.
#[derive(PartialEq, Debug, Clone)]
pub enum RatingCell {
    /// A numeric rating. It is only valid within [MIN_RATING, MAX_RATING].
    Score(f64),
    /// Nothing was entered for this pair.
    Blank,
    /// Some content that could not be understood as a number.
    Unreadable(String),
}

/// A square table of ratings.
///
/// `ratings[i][j]` is how participant `i` (the rater) rated participant `j`
/// (the ratee). The diagonal holds the self-ratings.
#[derive(PartialEq, Debug, Clone)]
pub struct RatingMatrix {
    pub participants: Vec<String>,
    pub ratings: Vec<Vec<RatingCell>>,
}

impl RatingMatrix {
    /// Convenience constructor for fully numeric tables.
    pub fn from_scores(participants: &[String], scores: &[Vec<f64>]) -> RatingMatrix {
        RatingMatrix {
            participants: participants.to_vec(),
            ratings: scores
                .iter()
                .map(|row| row.iter().map(|x| RatingCell::Score(*x)).collect())
                .collect(),
        }
    }
}

// ******** Output data structures *********

/// The outcome of the aggregation for one participant.
#[derive(PartialEq, Debug, Clone)]
pub struct ParticipantResult {
    pub name: String,
    pub self_rating: f64,
    /// Mean of the ratings received from all the other participants.
    pub others_average_rating: f64,
    /// The final score used for ranking.
    pub elo_rating: f64,
    /// In pairwise mode: `elo_rating - self_rating`.
    /// In weighted average mode: `self_rating - others_average_rating`.
    pub difference: f64,
    /// 1 is the best. Tied participants share the lowest rank of their group.
    pub rank: u32,
    /// The Elo value before blending with the self and others ratings.
    /// Only set in pairwise mode.
    pub pairwise_elo: Option<f64>,
}

/// Errors that prevent the aggregation from completing.
///
/// No partial ranking is ever produced.
#[derive(PartialEq, Debug, Clone)]
pub enum ValidationError {
    TooFewParticipants {
        count: usize,
    },
    EmptyParticipantName {
        index: usize,
    },
    DuplicateParticipant(String),
    UnknownParticipant(String),
    /// The table does not have the expected shape. `found` is the size of the
    /// first row (or the number of rows) that does not match.
    MalformedMatrix {
        expected: usize,
        found: usize,
    },
    MissingRating {
        rater: String,
        ratee: String,
    },
    UnreadableRating {
        rater: String,
        ratee: String,
        content: String,
    },
    OutOfRange {
        rater: String,
        ratee: String,
        value: f64,
    },
    InvalidRules(String),
}

impl Error for ValidationError {}

impl Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::TooFewParticipants { count } => write!(
                f,
                "at least 2 participants are required, but {} were provided",
                count
            ),
            ValidationError::EmptyParticipantName { index } => {
                write!(f, "participant #{} has an empty name", index + 1)
            }
            ValidationError::DuplicateParticipant(name) => {
                write!(f, "participant {:?} appears more than once", name)
            }
            ValidationError::UnknownParticipant(name) => {
                write!(f, "{:?} is not a declared participant", name)
            }
            ValidationError::MalformedMatrix { expected, found } => write!(
                f,
                "the rating table must be {}x{}, found a dimension of {}",
                expected, expected, found
            ),
            ValidationError::MissingRating { rater, ratee } => {
                write!(f, "missing rating of {:?} by {:?}", ratee, rater)
            }
            ValidationError::UnreadableRating {
                rater,
                ratee,
                content,
            } => write!(
                f,
                "rating of {:?} by {:?} is not a number: {:?}",
                ratee, rater, content
            ),
            ValidationError::OutOfRange {
                rater,
                ratee,
                value,
            } => write!(
                f,
                "rating of {:?} by {:?} is {}, outside of [{}, {}]",
                ratee, rater, value, MIN_RATING, MAX_RATING
            ),
            ValidationError::InvalidRules(msg) => write!(f, "invalid rules: {}", msg),
        }
    }
}

// ********* Configuration **********

/// How the final score is obtained.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ScoringMode {
    /// Pairwise Elo adjustments, scaled by the self-rating and the average
    /// rating received from the others.
    PairwiseElo,
    /// Weighted average of the self-rating and the others' average.
    /// This is the simpler historical scoring, kept as an alternate mode.
    WeightedAverage,
}

/// Which pairs of participants are compared in the Elo pass.
///
/// - OrderedPairs processes (a, b) and (b, a): every unordered pair is
/// compared twice, once per direction.
///
/// - UnorderedPairs processes each unordered pair once, with the participant
/// listed first acting as the rater.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum PairCoverage {
    OrderedPairs,
    UnorderedPairs,
}

/// When the Elo adjustments of a pass take effect.
///
/// - Sequential applies each adjustment immediately: later comparisons see the
/// updated values, so the outcome depends on the participant order.
///
/// - Simultaneous computes every expectation from the values at the start of
/// the pass and applies the summed adjustments at the end. Participants with
/// identical rating patterns end with identical scores.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum UpdateSchedule {
    Sequential,
    Simultaneous,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AggregationRules {
    pub scoring_mode: ScoringMode,
    pub pair_coverage: PairCoverage,
    pub update_schedule: UpdateSchedule,
    /// Weight of the self-rating in weighted average mode. The others' average
    /// gets the remainder.
    pub self_weight: f64,
}

impl AggregationRules {
    pub const DEFAULT_RULES: AggregationRules = AggregationRules {
        scoring_mode: ScoringMode::PairwiseElo,
        pair_coverage: PairCoverage::OrderedPairs,
        update_schedule: UpdateSchedule::Simultaneous,
        self_weight: 0.3,
    };
}

impl Default for AggregationRules {
    fn default() -> Self {
        AggregationRules::DEFAULT_RULES
    }
}
