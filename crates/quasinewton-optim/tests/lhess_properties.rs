//! Property tests for the limited-memory inverse-Hessian operator.

use approx::assert_relative_eq;
use proptest::prelude::*;
use quasinewton_core::prelude::*;
use quasinewton_optim::{InitialHessian, LHess, UpdateOutcome};
use std::sync::Arc;

type V = DenseVector<f64>;

/// Curvature pairs (y, s) with y = D s for a positive diagonal D, so y·s > 0.
fn history(max_pairs: usize) -> impl Strategy<Value = (usize, Vec<f64>, Vec<Vec<f64>>, Vec<f64>)> {
    (1usize..6).prop_flat_map(move |n| {
        (
            Just(n),
            prop::collection::vec(0.5f64..5.0, n),
            prop::collection::vec(prop::collection::vec(-3.0f64..3.0, n), 1..max_pairs),
            prop::collection::vec(-5.0f64..5.0, n),
        )
    })
}

fn pair(d: &[f64], s: &[f64]) -> (V, V) {
    let s = DenseVector::from_slice(s);
    let y = DenseVector::from_slice(d).component_mul(&s).unwrap();
    (y, s)
}

proptest! {
    #[test]
    fn recursion_matches_two_loop(
        (_n, d, steps, v) in history(12),
        memory in 1usize..8,
        h0 in 0.1f64..3.0,
    ) {
        let mut h = LHess::new(InitialHessian::Scaled(h0), memory).unwrap();
        for s in &steps {
            prop_assume!(s.iter().map(|x| x * x).sum::<f64>() > 1e-3);
            let (y, s) = pair(&d, s);
            prop_assert_eq!(h.update(&y, &s).unwrap(), UpdateOutcome::Accepted);
        }

        let v = DenseVector::from_vec(v);
        let recursive = h.apply(&v).unwrap();
        let two_loop = h.apply_two_loop(&v).unwrap();
        for (a, b) in recursive.iter().zip(two_loop.iter()) {
            prop_assert!((a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs())));
        }
    }

    #[test]
    fn history_keeps_newest_pairs_in_order(
        (_n, d, steps, _v) in history(20),
        memory in 1usize..6,
    ) {
        let mut h = LHess::new(InitialHessian::Scaled(1.0), memory).unwrap();
        for s in &steps {
            prop_assume!(s.iter().map(|x| x * x).sum::<f64>() > 1e-3);
            let (y, s) = pair(&d, s);
            h.update(&y, &s).unwrap();
        }

        prop_assert_eq!(h.len(), steps.len().min(memory));
        let kept: Vec<&[f64]> = h.pairs().map(|p| p.s().as_slice()).collect();
        let expected: Vec<&[f64]> = steps[steps.len() - h.len()..]
            .iter()
            .map(|s| s.as_slice())
            .collect();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn apply_is_bit_identical_across_calls(
        (_n, d, steps, v) in history(8),
    ) {
        let mut h = LHess::new(InitialHessian::Scaled(1.0), 5).unwrap();
        for s in &steps {
            prop_assume!(s.iter().map(|x| x * x).sum::<f64>() > 1e-3);
            let (y, s) = pair(&d, s);
            h.update(&y, &s).unwrap();
        }
        let v = DenseVector::from_vec(v);
        let first = h.apply(&v).unwrap();
        let second = h.apply(&v).unwrap();
        let first_bits: Vec<u64> = first.iter().map(|x| x.to_bits()).collect();
        let second_bits: Vec<u64> = second.iter().map(|x| x.to_bits()).collect();
        prop_assert_eq!(first_bits, second_bits);
    }
}

#[test]
fn test_empty_history_returns_initial_operator_exactly() {
    let v = DenseVector::from_vec(vec![0.1, -0.3, 7.0]);

    let h = LHess::<f64, V>::new(InitialHessian::Scaled(1.0), 10).unwrap();
    assert_eq!(h.apply(&v).unwrap(), v);

    let h = LHess::<f64, V>::new(InitialHessian::Scaled(0.5), 10).unwrap();
    assert_eq!(h.apply(&v).unwrap(), v.scaled(0.5));
}

#[test]
fn test_approximates_inverse_of_diagonal_hessian() {
    // Exact curvature pairs of f(x) = ½ xᵀ diag(1, 4, 9) x along the axes.
    let a = [1.0, 4.0, 9.0];
    let v = DenseVector::from_vec(vec![1.0, 1.0, 1.0]);
    let exact = DenseVector::from_vec(vec![1.0, 0.25, 1.0 / 9.0]);
    let error = |h: &LHess<f64, V>| {
        let mut diff = h.apply(&v).unwrap();
        diff.axpy(-1.0, &exact).unwrap();
        diff.norm(NormKind::L2)
    };

    let mut h = LHess::new(InitialHessian::Scaled(1.0), 10).unwrap();
    let mut previous = error(&h);
    for i in [2, 1, 0] {
        let mut axis = vec![0.0; 3];
        axis[i] = 1.0;
        let (y, s) = pair(&a, &axis);
        h.update(&y, &s).unwrap();

        let current = error(&h);
        assert!(current < previous || current < 1e-12);
        previous = current;
    }

    let hv = h.apply(&v).unwrap();
    assert_relative_eq!(hv[0], 1.0, epsilon = 1e-12);
    assert_relative_eq!(hv[1], 0.25, epsilon = 1e-12);
    assert_relative_eq!(hv[2], 1.0 / 9.0, epsilon = 1e-12);
}

#[test]
fn test_secant_equation_with_operator_initial_guess() {
    let h0: Arc<dyn LinearOperator<f64, V>> =
        Arc::new(DiagonalOperator::new(DenseVector::from_vec(vec![2.0, 0.5])).unwrap());
    let mut h = LHess::new(InitialHessian::Operator(h0), 3).unwrap();

    let (y1, s1) = pair(&[3.0, 1.0], &[1.0, 1.0]);
    let (y2, s2) = pair(&[3.0, 1.0], &[1.0, -2.0]);
    h.update(&y1, &s1).unwrap();
    h.update(&y2, &s2).unwrap();

    let hy = h.apply(&y2).unwrap();
    assert_relative_eq!(hy[0], s2[0], epsilon = 1e-12);
    assert_relative_eq!(hy[1], s2[1], epsilon = 1e-12);
}

#[test]
fn test_dimension_guard_keeps_history() {
    let mut h = LHess::<f64, V>::new(InitialHessian::Scaled(1.0), 4).unwrap();
    let (y, s) = pair(&[1.0, 1.0], &[1.0, 2.0]);
    h.update(&y, &s).unwrap();

    let long = DenseVector::from_vec(vec![1.0, 1.0, 1.0]);
    assert!(h.update(&long, &long).unwrap_err().is_dimension_mismatch());
    assert!(h.apply(&long).is_err());
    assert!(h.apply_two_loop(&long).is_err());
    assert_eq!(h.len(), 1);
    assert_eq!(h.pairs().next().unwrap().s(), &s);
}

#[test]
fn test_long_history_apply() {
    let memory = 50_000;
    let mut h = LHess::<f64, V>::new(InitialHessian::Scaled(1.0), memory).unwrap();
    for k in 0..memory {
        let axis = if k % 2 == 0 { [1.0, 0.0] } else { [0.0, 1.0] };
        let (y, s) = pair(&[2.0, 1.0], &axis);
        assert_eq!(h.update(&y, &s).unwrap(), UpdateOutcome::Accepted);
    }
    assert_eq!(h.len(), memory);

    let v = DenseVector::from_vec(vec![1.0, 1.0]);
    let recursive = h.apply(&v).unwrap();
    let two_loop = h.apply_two_loop(&v).unwrap();
    assert_relative_eq!(recursive[0], 0.5, epsilon = 1e-12);
    assert_relative_eq!(recursive[1], 1.0, epsilon = 1e-12);
    assert_relative_eq!(recursive[0], two_loop[0], epsilon = 1e-12);
    assert_relative_eq!(recursive[1], two_loop[1], epsilon = 1e-12);
}
