// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Holding register storage.

use crate::frame::{Address, Exception, Quantity, Word};
use core::ops::Range;

/// Read access to holding registers.
pub trait ReadRegisters {
    /// Number of registers (`N`); valid addresses are `0..N`.
    fn size(&self) -> usize;

    /// Read `quantity` contiguous registers starting at `address`.
    ///
    /// Fails with [`Exception::IllegalDataAddress`] if `quantity` is `0`
    /// or the range reaches past the last register.
    fn read(&self, address: Address, quantity: Quantity) -> Result<&[Word], Exception>;
}

/// Write access to holding registers.
pub trait WriteRegisters: ReadRegisters {
    /// Overwrite contiguous registers starting at `address` with `words`.
    fn write(&mut self, address: Address, words: &[Word]) -> Result<(), Exception>;
}

/// Half-open index range `address..address + quantity` if it lies within `size`.
fn checked_range(
    address: Address,
    quantity: usize,
    size: usize,
) -> Result<Range<usize>, Exception> {
    let start = usize::from(address);
    let end = start + quantity;
    if quantity == 0 || end > size {
        return Err(Exception::IllegalDataAddress);
    }
    Ok(start..end)
}

/// A fixed number of holding registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterStore<const N: usize> {
    registers: [Word; N],
}

impl<const N: usize> RegisterStore<N> {
    /// Create a store with the given initial register values.
    #[must_use]
    pub const fn new(registers: [Word; N]) -> Self {
        Self { registers }
    }

    /// Number of registers.
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// All register values in address order.
    #[must_use]
    pub const fn as_slice(&self) -> &[Word] {
        &self.registers
    }
}

impl<const N: usize> Default for RegisterStore<N> {
    fn default() -> Self {
        Self::new([0; N])
    }
}

impl<const N: usize> ReadRegisters for RegisterStore<N> {
    fn size(&self) -> usize {
        N
    }

    fn read(&self, address: Address, quantity: Quantity) -> Result<&[Word], Exception> {
        let range = checked_range(address, usize::from(quantity), N)?;
        Ok(&self.registers[range])
    }
}

impl<const N: usize> WriteRegisters for RegisterStore<N> {
    fn write(&mut self, address: Address, words: &[Word]) -> Result<(), Exception> {
        let range = checked_range(address, words.len(), N)?;
        self.registers[range].copy_from_slice(words);
        Ok(())
    }
}
