use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest star value a review may carry.
pub const MIN_RATING: f64 = 0.5;
/// Highest star value a review may carry.
pub const MAX_RATING: f64 = 5.0;

/// Review star rating held as a count of half stars (1..=10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rating(u8);

impl Rating {
    /// Validate a client supplied value and snap it to the nearest half star.
    ///
    /// The same `[0.5, 5.0]` bound applies to creation and edits.
    pub fn from_client(value: f64) -> Result<Self, RatingError> {
        if !value.is_finite() {
            return Err(RatingError::NotFinite);
        }
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(RatingError::OutOfRange { value });
        }

        let halves = (value * 2.0).round() as u8;
        Ok(Self(halves))
    }

    pub const fn halves(self) -> u8 {
        self.0
    }

    pub fn value(self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl TryFrom<f64> for Rating {
    type Error = RatingError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Rating::from_client(value)
    }
}

impl From<Rating> for f64 {
    fn from(rating: Rating) -> Self {
        rating.value()
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.value())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RatingError {
    #[error("rating must be a finite number")]
    NotFinite,
    #[error("rating must be between 0.5 and 5.0 (found {value})")]
    OutOfRange { value: f64 },
}

/// Hospital mean rating held in tenths of a star.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct AggregateRating(u16);

impl AggregateRating {
    /// Mean of the given ratings rounded to one decimal, half rounding up.
    ///
    /// Works on half-star integers so `3.75` lands on `3.8` without float drift.
    pub fn mean_of<I>(ratings: I) -> Option<Self>
    where
        I: IntoIterator<Item = Rating>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0u64, 0u64), |(sum, count), rating| {
                (sum + u64::from(rating.halves()), count + 1)
            });

        if count == 0 {
            return None;
        }

        let tenths = (sum * 10 + count) / (2 * count);
        Some(Self(tenths as u16))
    }

    pub const fn tenths(self) -> u16 {
        self.0
    }

    pub fn value(self) -> f64 {
        f64::from(self.0) / 10.0
    }
}

impl TryFrom<f64> for AggregateRating {
    type Error = RatingError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(RatingError::NotFinite);
        }
        if !(0.0..=MAX_RATING).contains(&value) {
            return Err(RatingError::OutOfRange { value });
        }
        Ok(Self((value * 10.0).round() as u16))
    }
}

impl From<AggregateRating> for f64 {
    fn from(rating: AggregateRating) -> Self {
        rating.value()
    }
}

impl fmt::Display for AggregateRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.value())
    }
}
