pub use ndarray::prelude::*;

use crate::traits::*;
use num_traits::{Float, FromPrimitive};
use rand::Rng;
use rand_distr::OpenClosed01;
use std::ops::AddAssign;

fn from_unit<T: FromPrimitive>(x: f64) -> T {
    T::from_f64(x).expect("failed to type")
}

impl<T> SampleOps for Array2<T>
where
    T: Float + FromPrimitive,
{
    type Mat = Self;
    type Dim = (usize, usize);

    fn runif_rng<R: Rng>(dim: Self::Dim, rng: &mut R) -> Self::Mat {
        Array2::from_shape_simple_fn(dim, || from_unit(rng.sample(OpenClosed01)))
    }
}

impl<T> SampleOps for Array1<T>
where
    T: Float + FromPrimitive,
{
    type Mat = Self;
    type Dim = usize;

    fn runif_rng<R: Rng>(dim: Self::Dim, rng: &mut R) -> Self::Mat {
        Array1::from_shape_simple_fn(dim, || from_unit(rng.sample(OpenClosed01)))
    }
}

impl<T> StochasticOps for Array2<T>
where
    T: Float + FromPrimitive + 'static,
{
    type Mat = Self;
    type Scalar = T;

    fn sum_to_one_columns_inplace(&mut self) {
        for mut x_j in self.columns_mut() {
            let denom = x_j.sum();
            if denom > T::zero() {
                x_j.mapv_inplace(|x| x / denom);
            }
        }
    }

    fn sum_to_one_columns(&self) -> Self::Mat {
        let mut ret = self.clone();
        ret.sum_to_one_columns_inplace();
        ret
    }

    fn max_column_sum_deviation(&self) -> Self::Scalar {
        self.sum_axis(Axis(0))
            .iter()
            .fold(T::zero(), |acc, &s| acc.max((s - T::one()).abs()))
    }
}

/// A vector is treated as a single column
impl<T> StochasticOps for Array1<T>
where
    T: Float + FromPrimitive + 'static,
{
    type Mat = Self;
    type Scalar = T;

    fn sum_to_one_columns_inplace(&mut self) {
        let denom = self.sum();
        if denom > T::zero() {
            self.mapv_inplace(|x| x / denom);
        }
    }

    fn sum_to_one_columns(&self) -> Self::Mat {
        let mut ret = self.clone();
        ret.sum_to_one_columns_inplace();
        ret
    }

    fn max_column_sum_deviation(&self) -> Self::Scalar {
        (self.sum() - T::one()).abs()
    }
}

impl<T> GroupSumOps for Array2<T>
where
    T: Float + FromPrimitive + AddAssign,
{
    type Mat = Self;

    fn sum_rows_by_group(&self, groups: &[usize], num_groups: usize) -> anyhow::Result<Self::Mat> {
        if groups.len() != self.nrows() {
            return Err(anyhow::anyhow!(
                "{} group labels for {} rows",
                groups.len(),
                self.nrows()
            ));
        }

        let mut ret = Array2::<T>::zeros((num_groups, self.ncols()));

        for (&g, x_i) in groups.iter().zip(self.rows()) {
            if g >= num_groups {
                return Err(anyhow::anyhow!(
                    "group label {} vs. total # = {}",
                    g,
                    num_groups
                ));
            }
            let mut out_g = ret.row_mut(g);
            out_g += &x_i;
        }

        Ok(ret)
    }
}

impl<T> ArgmaxOps for Array2<T>
where
    T: Float,
{
    fn argmax_rows(&self) -> Vec<usize> {
        self.rows()
            .into_iter()
            .map(|x_i| {
                let mut best = 0;
                let mut best_val = T::neg_infinity();
                for (j, &x) in x_i.iter().enumerate() {
                    if x > best_val {
                        best = j;
                        best_val = x;
                    }
                }
                best
            })
            .collect()
    }
}
