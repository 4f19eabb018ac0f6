/// overflow-guarded Fermi-Dirac/Bose-Einstein occupations and their energy moments
pub mod fermi_dirac;
/// Coulomb, radiative and finite nucleon mass corrections, neutron decay phase space
pub mod corrections;
/// Born, radiatively corrected and finite-mass n↔p rate integrals
pub mod bulk_rates;
/// finite-temperature radiative corrections (VEGAS)
pub mod thermal_corrections;
/// per-era rate splines, normalization and persistence
pub mod rate_tables;

use crate::Utils::interpolation::InterpolationError;
use crate::Utils::load_from_file::TableError;
use crate::Utils::quadrature::IntegrationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeakRateError {
    #[error("weak-rate integral failed: {0}")]
    Integration(#[from] IntegrationError),
    #[error("weak-rate table: {0}")]
    Table(#[from] TableError),
    #[error("weak-rate interpolation: {0}")]
    Interpolation(#[from] InterpolationError),
}
