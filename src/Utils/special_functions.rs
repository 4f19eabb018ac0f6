use num_complex::Complex64;
use std::f64::consts::PI;

/// Apéry's constant ζ(3)
pub const ZETA3: f64 = 1.202_056_903_159_594_2;

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEF: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_13,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Principal branch of ln Γ(z) for complex z (Lanczos, g = 7).
/// Uses the reflection formula for Re z < 1/2.
pub fn ln_gamma_complex(z: Complex64) -> Complex64 {
    if z.re < 0.5 {
        let pi = Complex64::new(PI, 0.0);
        return pi.ln() - (pi * z).sin().ln() - ln_gamma_complex(Complex64::new(1.0, 0.0) - z);
    }
    let z = z - 1.0;
    let mut x = Complex64::new(LANCZOS_COEF[0], 0.0);
    for (i, c) in LANCZOS_COEF.iter().enumerate().skip(1) {
        x += *c / (z + i as f64);
    }
    let t = z + LANCZOS_G + 0.5;
    0.5 * (2.0 * PI).ln() + (z + 0.5) * t.ln() - t + x.ln()
}

/// ln |Γ(x)| for real x
pub fn ln_gamma(x: f64) -> f64 {
    ln_gamma_complex(Complex64::new(x, 0.0)).re
}

/// Γ(x) for real positive x
pub fn gamma(x: f64) -> f64 {
    ln_gamma(x).exp()
}

/// Dilogarithm Li₂(x) for real x ≤ 1.
pub fn dilog(x: f64) -> f64 {
    const PI2_6: f64 = PI * PI / 6.0;
    if x > 1.0 {
        return f64::NAN;
    }
    if x == 1.0 {
        return PI2_6;
    }
    if x < -1.0 {
        // Li2(x) = -π²/6 - ln²(-x)/2 - Li2(1/x)
        let l = (-x).ln();
        return -PI2_6 - 0.5 * l * l - dilog(1.0 / x);
    }
    if x < 0.0 {
        // Li2(x) = -Li2(x/(x-1)) - ln²(1-x)/2, x/(x-1) in (0, 1/2]
        let l = (1.0 - x).ln();
        return -dilog_series(x / (x - 1.0)) - 0.5 * l * l;
    }
    if x <= 0.5 {
        return dilog_series(x);
    }
    // Euler reflection for 1/2 < x < 1
    PI2_6 - x.ln() * (1.0 - x).ln() - dilog_series(1.0 - x)
}

/// Σ x^k/k², used for |x| ≤ 1/2
fn dilog_series(x: f64) -> f64 {
    let mut sum = 0.0f64;
    let mut term = x;
    for k in 1..200 {
        let contribution = term / (k * k) as f64;
        sum += contribution;
        if contribution.abs() < 1e-17 * sum.abs().max(f64::MIN_POSITIVE) {
            break;
        }
        term *= x;
    }
    sum
}

/// Spence's function in the convention `spence(z) = ∫₁^z ln t/(1-t) dt = Li₂(1-z)`, z ≥ 0.
pub fn spence(z: f64) -> f64 {
    if z < 0.0 {
        return f64::NAN;
    }
    dilog(1.0 - z)
}
