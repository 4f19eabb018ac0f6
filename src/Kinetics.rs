/// The tracked light nuclei: nucleon numbers, mass excesses, spins and
/// their nuclear statistical equilibrium abundances.
pub mod nuclides;
/// Static table of the 63 tabulated reactions: reactant and product
/// multisets, detailed balance coefficients (α, β, γ) and the networks each
/// reaction belongs to.
/// ```rust, ignore
/// let spec = find_reaction("npdg").unwrap();
/// let ratio = spec.detailed_balance(0.5); // backward/forward at T9 = 0.5
/// ```
pub mod reaction_table;
/// Tabulated forward rates with nuisance and new-physics modifiers,
/// backward rates by detailed balance.
pub mod nuclear_rates;
/// Generic derivative and analytic Jacobian of the abundance ODEs.
pub mod nuclear_network;
mod kinetics_tests;

use crate::Utils::interpolation::InterpolationError;
use crate::Utils::load_from_file::TableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("nuclear rate table: {0}")]
    Table(#[from] TableError),
    #[error("nuclear rate interpolation: {0}")]
    Interpolation(#[from] InterpolationError),
    #[error("rate table for {reaction} is malformed: {reason}")]
    MalformedTable { reaction: String, reason: String },
    #[error("unknown reaction '{0}'")]
    UnknownReaction(String),
    #[error("no rate loaded for reaction {0}")]
    MissingRate(String),
}
