/// Errors reported by the pricing models and the global optimizer.
///
/// Every public entry point validates its inputs and fails with one of these
/// variants before touching model state, so a failed call never leaves a
/// half-updated model behind.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when an input series that must contain data is empty.
    #[error("{what} must not be empty")]
    EmptyInput {
        /// Name of the offending input.
        what: &'static str,
    },

    /// Returned when price and quantity series differ in length.
    #[error("length mismatch: {prices} prices but {quantities} quantities")]
    LengthMismatch {
        /// Number of prices supplied.
        prices: usize,
        /// Number of quantities supplied.
        quantities: usize,
    },

    /// Returned when the log-log regression has a zero denominator, i.e. a
    /// single observation or no variation in price.
    #[error("elasticity regression is singular: {n} observation(s) without price variation")]
    SingularRegression {
        /// Number of observations in the regression.
        n: usize,
    },

    /// Returned when a value that must be strictly positive is not.
    #[error("{what} must be positive, got {value}")]
    NonPositiveValue {
        /// Name of the offending value.
        what: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Returned when a value that must be finite is NaN or infinite.
    #[error("{what} must be finite, got {value}")]
    NonFiniteValue {
        /// Name of the offending value.
        what: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Returned when the derived price search interval is empty.
    #[error("degenerate price interval: lower ({lower}) exceeds upper ({upper})")]
    InvalidPriceInterval {
        /// Lower end of the derived interval.
        lower: f64,
        /// Upper end of the derived interval.
        upper: f64,
    },

    /// Returned when the revenue lift cannot be computed because revenue at the
    /// current price is zero.
    #[error("revenue at the current price is zero; lift is undefined")]
    ZeroBaselineRevenue,

    /// Returned when the lower bound is greater than the upper bound.
    #[error("invalid bounds: low ({low}) must be less than or equal to high ({high})")]
    InvalidBounds {
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when an optimizer is configured without any search dimension.
    #[error("search space has no bounds configured")]
    EmptyBounds,

    /// Returned when a point does not have one coordinate per dimension.
    #[error("dimension mismatch: expected {expected} coordinates but got {got}")]
    DimensionMismatch {
        /// The expected number of dimensions.
        expected: usize,
        /// The actual number of coordinates supplied.
        got: usize,
    },

    /// Returned when a model parameter is outside its valid range.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// The name of the parameter.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Returned when an A/B test variant is queried before it has any data.
    #[error("unknown variant '{0}'")]
    UnknownVariant(String),

    /// Returned when experiment counts are inconsistent.
    #[error("invalid observation for '{name}': {conversions} conversions out of {trials} trials")]
    InvalidObservation {
        /// The variant name.
        name: String,
        /// Reported conversions.
        conversions: u64,
        /// Reported trials.
        trials: u64,
    },

    /// Returned when an internal invariant is violated.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

/// Result alias used by every fallible operation in this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Reject NaN and infinite values.
pub(crate) fn ensure_finite(what: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::NonFiniteValue { what, value })
    }
}

/// Reject values that are not strictly positive (NaN included).
pub(crate) fn ensure_positive(what: &'static str, value: f64) -> Result<f64> {
    let value = ensure_finite(what, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(Error::NonPositiveValue { what, value })
    }
}
