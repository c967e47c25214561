// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory transport for session tests.

use std::{
    io::{self, Read, Write},
    vec::Vec,
};

/// Serves scripted input in chunks and records everything written.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    input: Vec<u8>,
    pos: usize,
    chunk_size: usize,
    reads: usize,
    pub(crate) output: Vec<u8>,
    pub(crate) fail_writes: bool,
}

impl MockTransport {
    pub(crate) fn new(input: &[u8]) -> Self {
        Self {
            input: input.to_vec(),
            chunk_size: usize::MAX,
            ..Default::default()
        }
    }

    /// Deliver at most `chunk_size` bytes per `read` call.
    pub(crate) fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Number of `read` calls that returned data.
    pub(crate) fn reads(&self) -> usize {
        self.reads
    }

    /// Number of input bytes not read yet.
    pub(crate) fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }
}

impl Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let cnt = buf.len().min(self.chunk_size).min(self.remaining());
        buf[..cnt].copy_from_slice(&self.input[self.pos..self.pos + cnt]);
        self.pos += cnt;
        if cnt > 0 {
            self.reads += 1;
        }
        Ok(cnt)
    }
}

impl Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::ErrorKind::BrokenPipe.into());
        }
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
