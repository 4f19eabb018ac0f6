//! Fermi-Dirac and Bose-Einstein occupation numbers with an overflow guard.
//!
//! Every exponential of the weak-rate integrands goes through [`safe_exp`]:
//! past `EXP_CUTOFF` the occupation is taken as exactly zero.
//!
//! The `e{n}p{k}` family are the k-th energy derivatives of `Eⁿ·f(xE)`
//! with `f(u) = 1/(eᵘ + 1)`, used by the finite nucleon mass terms.

pub const EXP_CUTOFF: f64 = 300.0;

/// `eᵃʳᵍ`, or `None` once the argument passes the cutoff.
#[inline]
pub fn safe_exp(arg: f64) -> Option<f64> {
    if arg < EXP_CUTOFF { Some(arg.exp()) } else { None }
}

/// `1/(eᵃʳᵍ + 1)`
#[inline]
pub fn fermi_dirac(arg: f64) -> f64 {
    safe_exp(arg).map_or(0.0, |e| 1.0 / (e + 1.0))
}

/// d/dE of `1/(e^{xE} + 1)`
#[inline]
pub fn fermi_dirac_derivative(e: f64, x: f64) -> f64 {
    safe_exp(x * e).map_or(0.0, |ex| -x * ex / ((ex + 1.0) * (ex + 1.0)))
}

/// `1/(eᵃʳᵍ − 1)`, zero outside `|arg| < EXP_CUTOFF`.
#[inline]
pub fn bose_einstein(arg: f64) -> f64 {
    if arg.abs() < EXP_CUTOFF {
        1.0 / arg.exp_m1()
    } else {
        0.0
    }
}

pub fn e2p0(e: f64, x: f64) -> f64 {
    e * e * fermi_dirac(x * e)
}

pub fn e3p0(e: f64, x: f64) -> f64 {
    e.powi(3) * fermi_dirac(x * e)
}

pub fn e2p1(e: f64, x: f64) -> f64 {
    let ex = x * e;
    safe_exp(ex).map_or(0.0, |w| e * (2.0 + w * (2.0 - ex)) / ((w + 1.0) * (w + 1.0)))
}

pub fn e3p1(e: f64, x: f64) -> f64 {
    let ex = x * e;
    safe_exp(ex).map_or(0.0, |w| e * e * (3.0 + w * (3.0 - ex)) / ((w + 1.0) * (w + 1.0)))
}

pub fn e4p1(e: f64, x: f64) -> f64 {
    let ex = x * e;
    safe_exp(ex).map_or(0.0, |w| e.powi(3) * (4.0 + w * (4.0 - ex)) / ((w + 1.0) * (w + 1.0)))
}

pub fn e2p2(e: f64, x: f64) -> f64 {
    let ex = x * e;
    match (safe_exp(ex), safe_exp(2.0 * ex)) {
        (Some(w), Some(w2)) => {
            ((ex * (ex - 4.0) + 2.0) * w2 + (4.0 - ex * (ex + 4.0)) * w + 2.0) / (w + 1.0).powi(3)
        }
        _ => 0.0,
    }
}

pub fn e3p2(e: f64, x: f64) -> f64 {
    let ex = x * e;
    match (safe_exp(ex), safe_exp(2.0 * ex)) {
        (Some(w), Some(w2)) => {
            e * ((12.0 - ex * (ex + 6.0)) * w + w2 * (ex * (ex - 6.0) + 6.0) + 6.0) / (w + 1.0).powi(3)
        }
        _ => 0.0,
    }
}

pub fn e4p2(e: f64, x: f64) -> f64 {
    let ex = x * e;
    match (safe_exp(ex), safe_exp(2.0 * ex)) {
        (Some(w), Some(w2)) => {
            e * e * ((24.0 - ex * (ex + 8.0)) * w + w2 * (ex - 6.0) * (ex - 2.0) + 12.0)
                / (w + 1.0).powi(3)
        }
        _ => 0.0,
    }
}
