/// Ratings tie-breakers appended to every non-rating preset
const RATING_TIEBREAK: &str = "-rec_rating,-bayes_rating,-avg_rating";

/// Named sort presets of the generic listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ordering {
    /// Recommendation rating first
    #[default]
    Rg,
    /// BoardGameGeek bayesian rating first
    Bgg,
    Complex,
    ComplexDesc,
    Year,
    YearDesc,
    Time,
    TimeDesc,
    Age,
    AgeDesc,
}

impl Ordering {
    pub const ALL: [Ordering; 10] = [
        Ordering::Rg,
        Ordering::Bgg,
        Ordering::Complex,
        Ordering::ComplexDesc,
        Ordering::Year,
        Ordering::YearDesc,
        Ordering::Time,
        Ordering::TimeDesc,
        Ordering::Age,
        Ordering::AgeDesc,
    ];

    /// URL spelling
    pub fn name(&self) -> &'static str {
        match self {
            Ordering::Rg => "rg",
            Ordering::Bgg => "bgg",
            Ordering::Complex => "complex",
            Ordering::ComplexDesc => "-complex",
            Ordering::Year => "year",
            Ordering::YearDesc => "-year",
            Ordering::Time => "time",
            Ordering::TimeDesc => "-time",
            Ordering::Age => "age",
            Ordering::AgeDesc => "-age",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ordering| ordering.name() == name)
    }

    /// Leading sort key; a `-` prefix means descending
    pub fn primary_key(&self) -> &'static str {
        match self {
            Ordering::Rg => "-rec_rating",
            Ordering::Bgg => "-bayes_rating",
            Ordering::Complex => "complexity",
            Ordering::ComplexDesc => "-complexity",
            Ordering::Year => "year",
            Ordering::YearDesc => "-year",
            Ordering::Time => "min_time",
            Ordering::TimeDesc => "-max_time",
            Ordering::Age => "min_age",
            Ordering::AgeDesc => "-min_age",
        }
    }

    /// Compound wire expression, comma-joined
    pub fn expression(&self) -> String {
        match self {
            Ordering::Rg => RATING_TIEBREAK.to_string(),
            Ordering::Bgg => "-bayes_rating,-rec_rating,-avg_rating".to_string(),
            other => format!("{},{}", other.primary_key(), RATING_TIEBREAK),
        }
    }

    /// Ascending on a nullable column: nulls would otherwise sort first
    pub fn primary_is_ascending(&self) -> bool {
        !self.primary_key().starts_with('-')
    }
}
