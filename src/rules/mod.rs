//! Concrete electoral rules, each implementing the scheduler's two-method
//! contract: positional scoring, rating/budget, pairwise dominance,
//! quota-and-transfer, and the random-dictator lotteries.

mod dominating;
mod positional;
mod random;
mod rating;
mod stv;

pub use dominating::DominatingSets;
pub use positional::Positional;
pub use random::{BoostedRandomDictator, RandomDictator};
pub use rating::RatingElection;
pub use stv::{Quota, Stv};
