//! Runtime label alphabet.
//!
//! The alphabet is declared in chunk-store metadata rather than fixed at
//! compile time, so it is held as a decoding table plus a reverse lookup.

use std::collections::HashMap;

use thiserror::Error;

/// Gap symbol used when store metadata does not name one
pub const DEFAULT_GAP_SYMBOL: char = '*';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("Duplicate label symbol '{0}' in alphabet")]
    DuplicateSymbol(char),

    #[error("Gap symbol '{0}' is not part of the label alphabet")]
    MissingGap(char),

    #[error("Label alphabet needs at least 2 symbols, found {0}")]
    TooFewLabels(usize),
}

/// Bidirectional mapping between label symbols and their indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCodec {
    decoding: Vec<char>,
    encoding: HashMap<char, usize>,
    gap_index: usize,
}

impl LabelCodec {
    /// Build a codec from the ordered alphabet and its gap symbol.
    ///
    /// # Errors
    ///
    /// Returns `LabelError` if a symbol repeats, the gap symbol is absent, or
    /// the alphabet has fewer than two symbols.
    pub fn new(decoding: Vec<char>, gap: char) -> Result<Self, LabelError> {
        if decoding.len() < 2 {
            return Err(LabelError::TooFewLabels(decoding.len()));
        }

        let mut encoding = HashMap::with_capacity(decoding.len());
        for (index, &symbol) in decoding.iter().enumerate() {
            if encoding.insert(symbol, index).is_some() {
                return Err(LabelError::DuplicateSymbol(symbol));
            }
        }

        let gap_index = *encoding.get(&gap).ok_or(LabelError::MissingGap(gap))?;

        Ok(Self {
            decoding,
            encoding,
            gap_index,
        })
    }

    /// Number of labels in the alphabet
    #[must_use]
    pub fn len(&self) -> usize {
        self.decoding.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decoding.is_empty()
    }

    #[must_use]
    pub fn symbols(&self) -> &[char] {
        &self.decoding
    }

    #[must_use]
    pub fn gap_index(&self) -> usize {
        self.gap_index
    }

    #[must_use]
    pub fn gap_symbol(&self) -> char {
        self.decoding[self.gap_index]
    }

    #[must_use]
    pub fn encode(&self, symbol: char) -> Option<usize> {
        self.encoding.get(&symbol).copied()
    }

    /// Index of the most probable label in `row`.
    ///
    /// Ties go to the lowest index, i.e. the first maximum in alphabet order.
    #[must_use]
    pub fn best_label(row: &[f32]) -> usize {
        let mut best = 0;
        for (index, &prob) in row.iter().enumerate().skip(1) {
            if prob > row[best] {
                best = index;
            }
        }
        best
    }

    /// Decode the most probable symbol of each row, dropping gaps.
    pub fn decode_rows<'a, I>(&self, rows: I) -> String
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        rows.into_iter()
            .map(Self::best_label)
            .filter(|&index| index != self.gap_index)
            .map(|index| self.decoding[index])
            .collect()
    }
}
