mod ballot;
mod profile;

pub use ballot::Ballot;
pub use profile::PreferenceProfile;

use num_bigint::BigInt;
use num_rational::BigRational;

/// Candidates are referred to by name throughout the engine.
pub type Candidate = String;

/// Exact ballot weight. Quota comparisons and surplus fractions must be
/// exact, so weights are arbitrary-precision rationals rather than floats.
pub type Weight = BigRational;

/// Build a whole-number weight.
pub fn whole(n: u64) -> Weight {
    BigRational::from_integer(BigInt::from(n))
}

/// Build a fractional weight.
pub fn frac(numer: i64, denom: i64) -> Weight {
    BigRational::new(BigInt::from(numer), BigInt::from(denom))
}
