//! Chunk stores and the per-reference index over them.
//!
//! A chunk store holds the chunks written by one inference run together with
//! the label alphabet they were decoded with. Several stores (e.g. one per
//! worker) are combined by [`ChunkIndex`], which serves each reference's chunks
//! in coordinate order.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::chunk::{Position, ProbabilityChunk};
use crate::core::labels::{LabelCodec, DEFAULT_GAP_SYMBOL};
use crate::parsing::ParseError;
use crate::stitching::ChunkSource;
use crate::utils::validation::validate_chunk;

/// Store format version for compatibility checking
pub const STORE_VERSION: &str = "1.0.0";

fn default_gap_symbol() -> char {
    DEFAULT_GAP_SYMBOL
}

/// Serializable container of probability chunks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkStore {
    pub version: String,

    /// Label alphabet, in index order
    pub label_decoding: Vec<char>,

    #[serde(default = "default_gap_symbol")]
    pub gap_symbol: char,

    pub chunks: Vec<ProbabilityChunk>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Json,
    Bincode,
}

/// Encoding and compression implied by a path's extension
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn encoding_for(path: &Path) -> (Encoding, bool) {
    let name = path.to_string_lossy().to_lowercase();
    let (stem, gzipped) = match name.strip_suffix(".gz") {
        Some(stem) => (stem.to_string(), true),
        None => (name, false),
    };
    let encoding = if stem.ends_with(".json") {
        Encoding::Json
    } else {
        Encoding::Bincode
    };
    (encoding, gzipped)
}

impl ChunkStore {
    pub fn new(label_decoding: Vec<char>, gap_symbol: char, chunks: Vec<ProbabilityChunk>) -> Self {
        Self {
            version: STORE_VERSION.to_string(),
            label_decoding,
            gap_symbol,
            chunks,
        }
    }

    /// Load a store, choosing the encoding from the file extension.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if the file cannot be read, or
    /// `ParseError::Json`/`ParseError::Bincode` if it cannot be decoded.
    pub fn read_from_file(path: &Path) -> Result<Self, ParseError> {
        let (encoding, gzipped) = encoding_for(path);
        let file = File::open(path)?;
        let reader: Box<dyn Read> = if gzipped {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        let reader = BufReader::new(reader);

        let store: Self = match encoding {
            Encoding::Json => serde_json::from_reader(reader)?,
            Encoding::Bincode => bincode::deserialize_from(reader)?,
        };

        // Version check (warn but don't fail)
        if store.version != STORE_VERSION {
            warn!(
                "Chunk store version mismatch in {} (expected {}, found {})",
                path.display(),
                STORE_VERSION,
                store.version
            );
        }

        debug!("Read {} chunks from {}.", store.chunks.len(), path.display());
        Ok(store)
    }

    /// Write the store, choosing the encoding from the file extension.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` on write failure or a serialization error.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ParseError> {
        let (encoding, gzipped) = encoding_for(path);
        let writer = BufWriter::new(File::create(path)?);

        if gzipped {
            let mut encoder = GzEncoder::new(writer, Compression::default());
            self.encode(&mut encoder, encoding)?;
            encoder.finish()?.flush()?;
        } else {
            let mut writer = writer;
            self.encode(&mut writer, encoding)?;
            writer.flush()?;
        }
        Ok(())
    }

    fn encode<W: Write>(&self, writer: W, encoding: Encoding) -> Result<(), ParseError> {
        match encoding {
            Encoding::Json => serde_json::to_writer(writer, self)?,
            Encoding::Bincode => bincode::serialize_into(writer, self)?,
        }
        Ok(())
    }

    /// Build the codec for this store's alphabet
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Labels` if the alphabet is malformed.
    pub fn label_codec(&self) -> Result<LabelCodec, ParseError> {
        Ok(LabelCodec::new(self.label_decoding.clone(), self.gap_symbol)?)
    }
}

/// Coverage of one reference across all stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceSummary {
    pub ref_name: String,
    pub chunk_count: usize,
    pub start: Position,
    pub end: Position,
}

/// All chunks of a set of stores, indexed by reference.
#[derive(Debug)]
pub struct ChunkIndex {
    codec: LabelCodec,
    chunks: Vec<ProbabilityChunk>,

    /// Reference name -> chunk indices sorted by (first, last) position
    by_ref: HashMap<String, Vec<usize>>,

    /// Reference names in first-seen order
    ref_order: Vec<String>,
}

impl ChunkIndex {
    /// Load and index chunk store files.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if a store cannot be read, the alphabets differ,
    /// or a chunk is malformed.
    pub fn open(paths: &[PathBuf]) -> Result<Self, ParseError> {
        let stores = paths
            .iter()
            .map(|path| ChunkStore::read_from_file(path))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_stores(stores)
    }

    /// Index stores that are already in memory.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidFormat` for an empty store list,
    /// `ParseError::LabelMismatch` if the stores disagree on the alphabet, or
    /// `ParseError::InvalidChunk` for a malformed chunk.
    pub fn from_stores(stores: Vec<ChunkStore>) -> Result<Self, ParseError> {
        let Some(first) = stores.first() else {
            return Err(ParseError::InvalidFormat(
                "No chunk stores given".to_string(),
            ));
        };
        let codec = first.label_codec()?;

        let mut chunks = Vec::new();
        for store in stores {
            let found = store.label_codec()?;
            if found != codec {
                return Err(ParseError::LabelMismatch {
                    expected: describe_alphabet(&codec),
                    found: describe_alphabet(&found),
                });
            }
            for chunk in store.chunks {
                validate_chunk(&chunk, codec.len()).map_err(|source| ParseError::InvalidChunk {
                    chunk: chunk.name.clone(),
                    source,
                })?;
                chunks.push(chunk);
            }
        }

        let mut by_ref: HashMap<String, Vec<usize>> = HashMap::new();
        let mut ref_order = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let entry = by_ref.entry(chunk.ref_name.clone()).or_insert_with(|| {
                ref_order.push(chunk.ref_name.clone());
                Vec::new()
            });
            entry.push(i);
        }
        for indices in by_ref.values_mut() {
            indices.sort_by_key(|&i| (chunks[i].first_pos(), chunks[i].last_pos()));
        }

        info!(
            "Indexed {} chunks over {} references.",
            chunks.len(),
            ref_order.len()
        );
        debug!("Label decoding is: {}", describe_alphabet(&codec));

        Ok(Self {
            codec,
            chunks,
            by_ref,
            ref_order,
        })
    }

    /// Total number of chunks
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk count and covered range per reference, in first-seen order
    #[must_use]
    pub fn summaries(&self) -> Vec<ReferenceSummary> {
        self.ref_order
            .iter()
            .filter_map(|name| {
                let indices = self.by_ref.get(name)?;
                let start = indices.iter().map(|&i| self.chunks[i].first_pos()).min()?;
                let end = indices.iter().map(|&i| self.chunks[i].last_pos()).max()?;
                Some(ReferenceSummary {
                    ref_name: name.clone(),
                    chunk_count: indices.len(),
                    start,
                    end,
                })
            })
            .collect()
    }
}

impl ChunkSource for ChunkIndex {
    fn label_codec(&self) -> &LabelCodec {
        &self.codec
    }

    fn ref_names(&self) -> Vec<String> {
        self.ref_order.clone()
    }

    fn chunks<'a>(&'a self, ref_name: &str) -> Box<dyn Iterator<Item = &'a ProbabilityChunk> + 'a> {
        match self.by_ref.get(ref_name) {
            Some(indices) => Box::new(indices.iter().map(move |&i| &self.chunks[i])),
            None => Box::new(std::iter::empty()),
        }
    }
}

fn describe_alphabet(codec: &LabelCodec) -> String {
    let symbols: String = codec.symbols().iter().collect();
    format!("{} (gap '{}')", symbols, codec.gap_symbol())
}
