#[cfg(test)]
mod tests {
    use crate::Utils::interpolation::{
        InterpolationError, LinearInterpolator, QuadraticSpline, logspace,
    };
    use crate::Utils::load_from_file::{LoadData, TableError, load_columns, save_columns};
    use crate::Utils::quadrature::{IntegrationError, QuadOptions, integrate, quad};
    use crate::Utils::special_functions::{dilog, gamma, ln_gamma_complex, spence};
    use crate::Utils::vegas::Vegas;
    use approx::assert_relative_eq;
    use num_complex::Complex64;
    use std::f64::consts::PI;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    #[test]
    fn test_quad_smooth_and_endpoint_singular() {
        let (r, e) = quad(|x: f64| x.sin(), 0.0, PI, &QuadOptions::default()).unwrap();
        assert_relative_eq!(r, 2.0, epsilon = 1e-10);
        assert!(e < 1e-8);
        let r = integrate(|x: f64| x.sqrt(), 0.0, 1.0, 1e-12, 1e-10).unwrap();
        assert_relative_eq!(r, 2.0 / 3.0, epsilon = 1e-9);
        // reversed bounds flip the sign
        let r = integrate(|x: f64| (-x).exp(), 2.0, 0.0, 1e-12, 1e-12).unwrap();
        assert_relative_eq!(r, -(1.0 - (-2.0f64).exp()), epsilon = 1e-11);
        assert_eq!(integrate(|x: f64| x, 1.0, 1.0, 1e-8, 1e-8).unwrap(), 0.0);
    }

    #[test]
    fn test_quad_failures_are_errors() {
        let opts = QuadOptions {
            epsabs: 0.0,
            epsrel: 1e-14,
            limit: 3,
        };
        let step = |x: f64| if x < 1.0 / 3.0 { 0.0 } else { 1.0 };
        match quad(step, 0.0, 1.0, &opts) {
            Err(IntegrationError::MaxSubdivisions { limit, .. }) => assert_eq!(limit, 3),
            other => panic!("unexpected {:?}", other),
        }
        let pole = |x: f64| 1.0 / x;
        assert!(matches!(
            quad(pole, -1.0, 1.0, &QuadOptions::default()),
            Err(IntegrationError::NonFinite(_))
        ));
        assert!(matches!(
            quad(|x: f64| x, 0.0, f64::INFINITY, &QuadOptions::default()),
            Err(IntegrationError::InvalidDomain(_))
        ));
    }

    #[test]
    fn test_linear_interpolator_sorts_and_extrapolates() {
        // decreasing abscissa, as a cooling temperature column
        let x = vec![4.0, 3.0, 2.0, 1.0];
        let y = vec![8.0, 6.0, 4.0, 2.0];
        let lin = LinearInterpolator::new(&x, &y).unwrap();
        assert_eq!(lin.x(), &[1.0, 2.0, 3.0, 4.0]);
        assert_relative_eq!(lin.eval(2.5), 5.0);
        assert_relative_eq!(lin.eval(0.0), 0.0);
        assert_relative_eq!(lin.eval(10.0), 20.0);
        assert_eq!(lin.x_range(), (1.0, 4.0));
        assert_eq!(
            LinearInterpolator::new(&[1.0], &[1.0]).unwrap_err(),
            InterpolationError::TooFewNodes {
                required: 2,
                got: 1
            }
        );
        assert_eq!(
            LinearInterpolator::new(&[1.0, 2.0], &[1.0]).unwrap_err(),
            InterpolationError::LengthMismatch(2, 1)
        );
    }

    #[test]
    fn test_quadratic_spline_reproduces_parabola() {
        let f = |x: f64| 3.0 * x * x - 2.0 * x + 1.0;
        let x = vec![0.0, 0.3, 1.0, 1.2, 2.5, 4.0];
        let y: Vec<f64> = x.iter().map(|&v| f(v)).collect();
        let spline = QuadraticSpline::new(&x, &y).unwrap();
        for xq in [-1.0, 0.1, 0.75, 1.1, 2.0, 3.3, 5.0] {
            assert_relative_eq!(spline.eval(xq), f(xq), epsilon = 1e-10);
            assert_relative_eq!(spline.derivative(xq), 6.0 * xq - 2.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_quadratic_spline_hits_nodes() {
        let x = logspace(1e-3, 10.0, 40);
        let y: Vec<f64> = x.iter().map(|&v| (-1.0 / v).exp() * v.powf(1.5)).collect();
        let spline = QuadraticSpline::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert_relative_eq!(spline.eval(*xi), *yi, max_relative = 1e-12, epsilon = 1e-300);
        }
    }

    #[test]
    fn test_logspace() {
        let v = logspace(1e7, 1e10, 4);
        assert_eq!(v.len(), 4);
        assert_eq!(v[0], 1e7);
        assert_eq!(v[3], 1e10);
        assert_relative_eq!(v[1], 1e8, max_relative = 1e-12);
        let dec = logspace(100.0, 1.0, 3);
        assert_relative_eq!(dec[1], 10.0, max_relative = 1e-12);
    }

    #[test]
    fn test_special_functions() {
        assert_relative_eq!(gamma(5.0), 24.0, max_relative = 1e-12);
        assert_relative_eq!(gamma(0.5), PI.sqrt(), max_relative = 1e-12);
        // |Γ(1+iy)|² = πy/sinh(πy)
        let y = 2.0;
        let lg = ln_gamma_complex(Complex64::new(1.0, y));
        assert_relative_eq!(
            (2.0 * lg.re).exp(),
            PI * y / (PI * y).sinh(),
            max_relative = 1e-10
        );
        // reflection branch
        let lg = ln_gamma_complex(Complex64::new(-0.5, 0.0));
        assert_relative_eq!(lg.re.exp(), 2.0 * PI.sqrt(), max_relative = 1e-10);

        assert_relative_eq!(
            dilog(0.5),
            PI * PI / 12.0 - 0.5 * 2f64.ln().powi(2),
            max_relative = 1e-13
        );
        assert_relative_eq!(dilog(-1.0), -PI * PI / 12.0, max_relative = 1e-13);
        assert_relative_eq!(dilog(0.9), 1.299_714_723_004_958_8, max_relative = 1e-12);
        assert_relative_eq!(spence(1.0), 0.0, epsilon = 1e-15);
        assert_relative_eq!(spence(0.0), PI * PI / 6.0, max_relative = 1e-14);
        assert!(spence(-1.0).is_nan());
    }

    #[test]
    fn test_vegas_polynomial_and_peak() {
        let mut vegas = Vegas::new(vec![(0.0, 1.0), (0.0, 1.0)], 7).unwrap();
        vegas.integrate(|x| x[0] * x[1], 5, 2000, true).unwrap();
        let res = vegas.integrate(|x| x[0] * x[1], 10, 5000, true).unwrap();
        assert!((res.mean - 0.25).abs() < 0.01);
        assert!(res.sdev > 0.0 && res.chi2_dof.is_finite());

        let s = 0.05;
        let peak = |x: &[f64]| {
            (-((x[0] - 0.5).powi(2) + (x[1] - 0.5).powi(2)) / (2.0 * s * s)).exp()
        };
        let mut vegas = Vegas::new(vec![(0.0, 1.0), (0.0, 1.0)], 11).unwrap();
        vegas.integrate(peak, 10, 5000, true).unwrap();
        let res = vegas.integrate(peak, 10, 10000, true).unwrap();
        assert_relative_eq!(res.mean, 2.0 * PI * s * s, max_relative = 0.02);
        assert_eq!(res.n_itn, 10);
    }

    #[test]
    fn test_vegas_is_reproducible_and_validates() {
        let f = |x: &[f64]| x[0].powi(2);
        let a = Vegas::new(vec![(0.0, 2.0)], 3)
            .unwrap()
            .integrate(f, 4, 1000, true)
            .unwrap();
        let b = Vegas::new(vec![(0.0, 2.0)], 3)
            .unwrap()
            .integrate(f, 4, 1000, true)
            .unwrap();
        assert_eq!(a, b);
        assert!(Vegas::new(vec![(1.0, 0.0)], 1).is_err());
        assert!(Vegas::new(vec![], 1).is_err());
    }

    #[test]
    fn test_table_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("grid.txt");
        let t = vec![1.0e9, 2.0e9, 3.0e9];
        let r = vec![0.5, 1.5e-3, 7.25e10];
        save_columns(&path, &[t.as_slice(), r.as_slice()]).unwrap();
        let cols = LoadData::new(&path).load_columns(2).unwrap();
        assert_eq!(cols[0], t);
        assert_eq!(cols[1], r);
    }

    #[test]
    fn test_table_errors() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# T9 median expsigma").unwrap();
        writeln!(file, "0.001 1.0 1.1").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "0.002 2.0").unwrap();
        match load_columns(file.path(), 3) {
            Err(TableError::ColumnCount { line, found, .. }) => {
                assert_eq!(line, 4);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        let mut bad = NamedTempFile::new().unwrap();
        writeln!(bad, "0.001 abc").unwrap();
        assert!(matches!(
            load_columns(bad.path(), 2),
            Err(TableError::Parse { .. })
        ));
        let empty = NamedTempFile::new().unwrap();
        assert!(matches!(
            load_columns(empty.path(), 2),
            Err(TableError::Empty(_))
        ));
        assert!(matches!(
            load_columns(std::path::Path::new("no/such/table.txt"), 2),
            Err(TableError::NotFound(_))
        ));
        assert!(matches!(
            save_columns(&std::env::temp_dir().join("ragged.txt"), &[&[1.0][..], &[1.0, 2.0][..]]),
            Err(TableError::RaggedColumns(_))
        ));
    }
}
