/// Whitespace-separated numeric tables: loading with validation and saving
/// in the column layout used by all persisted grids of the crate.
pub mod load_from_file;
/// Linear interpolation and C1 quadratic splines with extrapolation.
pub mod interpolation;
/// Adaptive Gauss–Kronrod quadrature. Failure to converge is reported as an error.
pub mod quadrature;
/// ζ(3), complex log-Gamma, dilogarithm and Spence's function.
pub mod special_functions;
/// VEGAS adaptive Monte-Carlo integration for the multidimensional
/// thermal corrections of the weak rates.
pub mod vegas;
mod utils_tests;
