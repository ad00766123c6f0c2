/// Operations to sample random arrays from a caller-provided random
/// number generator, so that results can be reproduced from a seed
pub trait SampleOps {
    type Mat;
    type Dim;

    /// Sample an array from a uniform distribution `U(0,1]`
    ///
    /// Zero is excluded so that the sample can be normalized into a
    /// strictly positive probability vector.
    fn runif_rng<R: rand::Rng>(dim: Self::Dim, rng: &mut R) -> Self::Mat;
}

/// Make columns valid probability vectors
pub trait StochasticOps {
    type Mat;
    type Scalar;

    /// `x[:,j] /= sum(x[:,j])` for every column `j`
    fn sum_to_one_columns_inplace(&mut self);

    fn sum_to_one_columns(&self) -> Self::Mat;

    /// Largest `|sum(x[:,j]) - 1|` over columns
    fn max_column_sum_deviation(&self) -> Self::Scalar;
}

/// Segmented sums keyed by an integer group label
pub trait GroupSumOps {
    type Mat;

    /// `out[g,:] = sum over {i : groups[i] = g} of self[i,:]`
    ///
    /// * `groups` - group label of each row (one per row)
    /// * `num_groups` - number of output rows; every label must be less than this
    fn sum_rows_by_group(&self, groups: &[usize], num_groups: usize) -> anyhow::Result<Self::Mat>;
}

/// Arg-max along rows
pub trait ArgmaxOps {
    /// The column index of the largest value in each row. Ties go to
    /// the lowest index; `NaN` never wins.
    fn argmax_rows(&self) -> Vec<usize>;
}

/// Write arrays to delimited text files
pub trait IoOps {
    fn write_file_delim(&self, file: &str, delim: &str) -> anyhow::Result<()>;

    fn to_tsv(&self, tsv_file: &str) -> anyhow::Result<()> {
        self.write_file_delim(tsv_file, "\t")
    }

    fn to_csv(&self, csv_file: &str) -> anyhow::Result<()> {
        self.write_file_delim(csv_file, ",")
    }
}
