use approx::assert_abs_diff_eq;
use matrix_util::ndarray_util::*;
use matrix_util::traits::{SampleOps, StochasticOps};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn ndarray_sum_to_one_columns() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut xx = Array2::<f64>::runif_rng((100, 10), &mut rng);
    xx.sum_to_one_columns_inplace();

    for x_j in xx.columns() {
        assert_abs_diff_eq!(x_j.sum(), 1.0, epsilon = 1e-12);
    }
    assert!(xx.max_column_sum_deviation() < 1e-12);
}

#[test]
fn ndarray_sum_to_one_vector() {
    let xx = array![1.0, 3.0, 4.0];
    let yy = xx.sum_to_one_columns();
    assert_abs_diff_eq!(yy, array![0.125, 0.375, 0.5], epsilon = 1e-12);
}

#[test]
fn ndarray_zero_column_left_alone() {
    let mut xx = array![[0.0, 2.0], [0.0, 2.0]];
    xx.sum_to_one_columns_inplace();
    assert_eq!(xx, array![[0.0, 0.5], [0.0, 0.5]]);
    assert_abs_diff_eq!(xx.max_column_sum_deviation(), 1.0);
}
