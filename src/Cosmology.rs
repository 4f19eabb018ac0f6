/// fundamental constants, unit conversions and run-dependent cosmological parameters
pub mod physical_constants;
/// photon and neutrino temperatures, scale factor and time-temperature maps
pub mod background;
