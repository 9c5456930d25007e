#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use anyhow::{Context, Result as AnyResult};
use rand::Rng;
use std::collections::VecDeque;

/// Capped FIFO of heap chunks, filled with random bytes so the pages are resident.
#[derive(Debug)]
pub struct MemoryBallast {
    chunks: VecDeque<Box<[u8]>>,
    chunk_bytes: usize,
    max_chunks: usize,
}

impl MemoryBallast {
    pub fn new(chunk_bytes: usize, max_chunks: usize) -> Self {
        Self {
            chunks: VecDeque::new(),
            chunk_bytes,
            max_chunks,
        }
    }

    /// Returns how many chunks were evicted to stay under the cap.
    pub fn grow(&mut self) -> AnyResult<usize> {
        let mut chunk = Vec::new();
        chunk
            .try_reserve_exact(self.chunk_bytes)
            .with_context(|| format!("allocate {} byte chunk", self.chunk_bytes))?;
        chunk.resize(self.chunk_bytes, 0u8);
        let mut chunk = chunk.into_boxed_slice();
        rand::rng().fill(&mut chunk[..]);
        self.chunks.push_back(chunk);
        let mut evicted = 0;
        while self.chunks.len() > self.max_chunks {
            self.chunks.pop_front();
            evicted += 1;
        }
        Ok(evicted)
    }

    pub fn maybe_grow(&mut self, iteration: u64, every: u64) -> AnyResult<bool> {
        if every == 0 || iteration % every != 0 {
            return Ok(false);
        }
        self.grow()?;
        Ok(true)
    }

    pub fn release(&mut self) {
        self.chunks.clear();
        self.chunks.shrink_to_fit();
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn max_chunks(&self) -> usize {
        self.max_chunks
    }

    pub fn held_bytes(&self) -> usize {
        self.chunks.iter().map(|c| c.len()).sum()
    }
}
