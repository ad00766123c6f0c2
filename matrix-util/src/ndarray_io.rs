use crate::common_io::write_lines;
use crate::traits::IoOps;
use ndarray::prelude::*;
use std::fmt::Display;

fn join_row<'a, T, I>(row: I, delim: &str) -> Box<str>
where
    T: Display + 'a,
    I: IntoIterator<Item = &'a T>,
{
    row.into_iter()
        .map(|x| format!("{}", x))
        .collect::<Vec<String>>()
        .join(delim)
        .into_boxed_str()
}

impl<T> IoOps for Array2<T>
where
    T: Display,
{
    fn write_file_delim(&self, file: &str, delim: &str) -> anyhow::Result<()> {
        let lines: Vec<Box<str>> = self.rows().into_iter().map(|row| join_row(row, delim)).collect();
        write_lines(&lines, file)
    }
}

/// A vector is written as a single column
impl<T> IoOps for Array1<T>
where
    T: Display,
{
    fn write_file_delim(&self, file: &str, _delim: &str) -> anyhow::Result<()> {
        let lines: Vec<Box<str>> = self.iter().map(|x| format!("{}", x).into_boxed_str()).collect();
        write_lines(&lines, file)
    }
}
