//! Re-enumerable streams of symbol minibatches.
//!
//! A source hands out a fresh iterator per epoch. The iterator ending
//! (`None`) marks the end of the epoch; an `Err` item is a read failure
//! and aborts whatever pass is consuming it.

use matrix_util::common_io::{is_comment_line, open_buf_reader};
use std::collections::VecDeque;
use std::io::BufRead;

pub type Symbols = Vec<usize>;

pub type MinibatchIter<'a> = Box<dyn Iterator<Item = anyhow::Result<Symbols>> + 'a>;

pub trait MinibatchSource {
    /// Enumerate minibatches from the first one
    fn minibatches(&self) -> anyhow::Result<MinibatchIter<'_>>;
}

///
/// In-memory symbols split into consecutive chunks. Chunk order and
/// content are fixed at construction, so every epoch sees the same
/// minibatches.
///
#[derive(Debug, Clone)]
pub struct Minibatches {
    pub chunks: Vec<Symbols>,
}

impl Minibatches {
    /// Split `symbols` into consecutive chunks of `batch_size` (the last
    /// one may be shorter)
    pub fn new(symbols: &[usize], batch_size: usize) -> anyhow::Result<Self> {
        if batch_size == 0 {
            return Err(anyhow::anyhow!("batch size must be positive"));
        }
        Ok(Self {
            chunks: symbols.chunks(batch_size).map(|x| x.to_vec()).collect(),
        })
    }

    /// Take an explicit partition
    pub fn from_chunks(chunks: Vec<Symbols>) -> Self {
        Self { chunks }
    }

    /// Symbols at `indices`, chunked by `batch_size`
    pub fn from_indices(
        symbols: &[usize],
        indices: &[usize],
        batch_size: usize,
    ) -> anyhow::Result<Self> {
        let subset = indices
            .iter()
            .map(|&i| {
                symbols.get(i).copied().ok_or(anyhow::anyhow!(
                    "index {} vs. total # symbols = {}",
                    i,
                    symbols.len()
                ))
            })
            .collect::<anyhow::Result<Vec<usize>>>()?;
        Self::new(&subset, batch_size)
    }

    pub fn num_minibatch(&self) -> usize {
        self.chunks.len()
    }

    pub fn size(&self) -> usize {
        self.chunks.iter().map(|x| x.len()).sum()
    }
}

impl MinibatchSource for Minibatches {
    fn minibatches(&self) -> anyhow::Result<MinibatchIter<'_>> {
        Ok(Box::new(self.chunks.iter().map(|x| Ok(x.clone()))))
    }
}

///
/// Symbols streamed from a text file (plain or `.gz`). Tokens are
/// whitespace-separated non-negative integers; lines starting with `#`
/// or `%` are skipped. The file is re-opened on every enumeration and
/// read line by line; memory is bounded by one minibatch plus the
/// longest line.
///
#[derive(Debug, Clone)]
pub struct LabelFileMinibatches {
    file: Box<str>,
    batch_size: usize,
}

impl LabelFileMinibatches {
    pub fn new(file: &str, batch_size: usize) -> anyhow::Result<Self> {
        if batch_size == 0 {
            return Err(anyhow::anyhow!("batch size must be positive"));
        }
        Ok(Self {
            file: file.into(),
            batch_size,
        })
    }

    pub fn file(&self) -> &str {
        &self.file
    }
}

impl MinibatchSource for LabelFileMinibatches {
    fn minibatches(&self) -> anyhow::Result<MinibatchIter<'_>> {
        let reader = open_buf_reader(&self.file)?;
        Ok(Box::new(SymbolChunks {
            lines: reader.lines(),
            pending: VecDeque::new(),
            batch_size: self.batch_size,
            line_no: 0,
            file: &self.file,
            failed: false,
        }))
    }
}

struct SymbolChunks<'a> {
    lines: std::io::Lines<Box<dyn BufRead>>,
    pending: VecDeque<usize>,
    batch_size: usize,
    line_no: usize,
    file: &'a str,
    failed: bool,
}

impl SymbolChunks<'_> {
    fn parse_line(&mut self, line: &str) -> anyhow::Result<()> {
        for word in line.split_whitespace() {
            let x = word.parse::<usize>().map_err(|e| {
                anyhow::anyhow!(
                    "{}:{}: cannot parse `{}` as a symbol: {}",
                    self.file,
                    self.line_no,
                    word,
                    e
                )
            })?;
            self.pending.push_back(x);
        }
        Ok(())
    }
}

impl Iterator for SymbolChunks<'_> {
    type Item = anyhow::Result<Symbols>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        while self.pending.len() < self.batch_size {
            match self.lines.next() {
                Some(Ok(line)) => {
                    self.line_no += 1;
                    if is_comment_line(&line) {
                        continue;
                    }
                    if let Err(e) = self.parse_line(&line) {
                        self.failed = true;
                        return Some(Err(e));
                    }
                }
                Some(Err(e)) => {
                    self.failed = true;
                    return Some(Err(e.into()));
                }
                None => break,
            }
        }

        if self.pending.is_empty() {
            return None;
        }

        let ntake = self.batch_size.min(self.pending.len());
        Some(Ok(self.pending.drain(..ntake).collect()))
    }
}

/// Drain a source into one vector of symbols
pub fn collect_symbols<B>(data: &B) -> anyhow::Result<Symbols>
where
    B: MinibatchSource + ?Sized,
{
    let mut ret = vec![];
    for mb in data.minibatches()? {
        ret.extend(mb?);
    }
    Ok(ret)
}

/// `1 + largest symbol` seen in a full pass over `data`
pub fn scan_alphabet_size<B>(data: &B) -> anyhow::Result<usize>
where
    B: MinibatchSource + ?Sized,
{
    let mut max_symbol: Option<usize> = None;
    for mb in data.minibatches()? {
        if let Some(&x) = mb?.iter().max() {
            max_symbol = Some(max_symbol.map_or(x, |m| m.max(x)));
        }
    }
    max_symbol
        .map(|x| x + 1)
        .ok_or(anyhow::anyhow!("no symbols found"))
}
