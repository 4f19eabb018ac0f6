//! Matrix-element and QED correction tables of the e±γ plasma.
//!
//! Seven text files are read from `<data_dir>/thermo/`:
//!
//! | file | columns | meaning |
//! |---|---|---|
//! | `nue_scatt.txt`, `numu_scatt.txt` | T, f | ν–e± scattering correction |
//! | `nue_ann.txt`, `numu_ann.txt` | T, f | e⁺e⁻ → νν̄ annihilation correction |
//! | `QED_P_int.txt` | T, P₁, P₂ | QED pressure correction P₁ + P₂ |
//! | `QED_dP_intdT.txt` | T, P₁', P₂' | its first derivative |
//! | `QED_d2P_intdT2.txt` | T, P₁'', P₂'' | its second derivative |
//!
//! All columns are interpolated linearly in T (MeV) and extrapolated outside the grid.
use crate::Thermodynamics::ThermoError;
use crate::Utils::interpolation::LinearInterpolator;
use crate::Utils::load_from_file::load_columns;
use crate::settings::{BbnConfig, ThermoTablesKind};
use log::info;
use std::path::Path;

/// A correction factor as a function of temperature: either a constant or a table.
#[derive(Debug, Clone)]
pub enum TableFn {
    Constant(f64),
    Tabulated(LinearInterpolator),
}

impl TableFn {
    pub fn eval(&self, t: f64) -> f64 {
        match self {
            TableFn::Constant(c) => *c,
            TableFn::Tabulated(lin) => lin.eval(t),
        }
    }

    fn two_columns(path: &Path) -> Result<Self, ThermoError> {
        let cols = load_columns(path, 2)?;
        Ok(TableFn::Tabulated(LinearInterpolator::new(&cols[0], &cols[1])?))
    }

    /// three-column QED table, value = col1 + col2
    fn summed_columns(path: &Path) -> Result<Self, ThermoError> {
        let cols = load_columns(path, 3)?;
        let sum: Vec<f64> = cols[1].iter().zip(&cols[2]).map(|(a, b)| a + b).collect();
        Ok(TableFn::Tabulated(LinearInterpolator::new(&cols[0], &sum)?))
    }
}

#[derive(Debug, Clone)]
pub struct ThermoTables {
    pub nue_scatt: TableFn,
    pub numu_scatt: TableFn,
    pub nue_ann: TableFn,
    pub numu_ann: TableFn,
    pub p_qed: TableFn,
    pub dp_qed_dt: TableFn,
    pub d2p_qed_dt2: TableFn,
}

impl ThermoTables {
    /// Ideal plasma: unit matrix-element factors and no QED correction.
    pub fn ideal() -> Self {
        ThermoTables {
            nue_scatt: TableFn::Constant(1.0),
            numu_scatt: TableFn::Constant(1.0),
            nue_ann: TableFn::Constant(1.0),
            numu_ann: TableFn::Constant(1.0),
            p_qed: TableFn::Constant(0.0),
            dp_qed_dt: TableFn::Constant(0.0),
            d2p_qed_dt2: TableFn::Constant(0.0),
        }
    }

    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, ThermoError> {
        let dir = dir.as_ref();
        info!("loading plasma correction tables from {}", dir.display());
        Ok(ThermoTables {
            nue_scatt: TableFn::two_columns(&dir.join("nue_scatt.txt"))?,
            numu_scatt: TableFn::two_columns(&dir.join("numu_scatt.txt"))?,
            nue_ann: TableFn::two_columns(&dir.join("nue_ann.txt"))?,
            numu_ann: TableFn::two_columns(&dir.join("numu_ann.txt"))?,
            p_qed: TableFn::summed_columns(&dir.join("QED_P_int.txt"))?,
            dp_qed_dt: TableFn::summed_columns(&dir.join("QED_dP_intdT.txt"))?,
            d2p_qed_dt2: TableFn::summed_columns(&dir.join("QED_d2P_intdT2.txt"))?,
        })
    }

    pub fn from_config(config: &BbnConfig) -> Result<Self, ThermoError> {
        match config.thermo_tables {
            ThermoTablesKind::Tabulated => Self::load(config.thermo_dir()),
            ThermoTablesKind::Ideal => {
                info!("using ideal plasma thermodynamics");
                Ok(Self::ideal())
            }
        }
    }
}
