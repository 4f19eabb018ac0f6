/// correction tables of the plasma: neutrino matrix elements and QED pressure
pub mod thermo_tables;
/// photon, e± and neutrino energy densities, pressures, plasma entropy and
/// neutrino collision terms
pub mod plasma;
/// optional extra radiation sector with its own temperature
pub mod new_physics;
mod thermo_tests;

use crate::Utils::interpolation::InterpolationError;
use crate::Utils::load_from_file::TableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThermoError {
    #[error("plasma table: {0}")]
    Table(#[from] TableError),
    #[error("plasma table interpolation: {0}")]
    Interpolation(#[from] InterpolationError),
}
