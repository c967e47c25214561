// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::{iter::FusedIterator, slice::ChunksExact};

use super::*;
use crate::error::*;

/// Register values as they travel on the wire: two big-endian bytes per word.
///
/// The byte slice always has an even length.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Data<'d> {
    bytes: RawData<'d>,
}

impl<'d> Data<'d> {
    /// Serialize `words` into `target`.
    ///
    /// Fails if `words` is empty or does not fit.
    pub fn from_words(words: &[Word], target: &'d mut [u8]) -> Result<Self, Error> {
        let byte_count = words.len() * 2;
        if words.is_empty() || byte_count > target.len() {
            return Err(Error::BufferSize);
        }
        let target = &mut target[..byte_count];
        for (chunk, word) in target.chunks_exact_mut(2).zip(words) {
            BigEndian::write_u16(chunk, *word);
        }
        Ok(Self { bytes: target })
    }

    /// Borrow already serialized register values.
    pub fn from_bytes(bytes: &'d [u8]) -> Result<Self, Error> {
        if bytes.len() % 2 != 0 {
            return Err(Error::BufferSize);
        }
        Ok(Self { bytes })
    }

    pub(crate) fn copy_to(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= self.bytes.len());
        buf[..self.bytes.len()].copy_from_slice(self.bytes);
    }

    /// Number of registers.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len() / 2
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Value of the register at `idx`.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<Word> {
        let offset = idx.checked_mul(2)?;
        self.bytes
            .get(offset..offset.checked_add(2)?)
            .map(BigEndian::read_u16)
    }

    /// The serialized register values.
    #[must_use]
    pub const fn payload(&self) -> &'d [u8] {
        self.bytes
    }

    #[must_use]
    pub fn words(&self) -> Words<'d> {
        Words(self.bytes.chunks_exact(2))
    }
}

/// Iterator over the register values of [`Data`].
#[derive(Debug, Clone)]
pub struct Words<'d>(ChunksExact<'d, u8>);

impl Iterator for Words<'_> {
    type Item = Word;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(BigEndian::read_u16)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl DoubleEndedIterator for Words<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(BigEndian::read_u16)
    }
}

impl ExactSizeIterator for Words<'_> {}

impl FusedIterator for Words<'_> {}

impl<'d> IntoIterator for Data<'d> {
    type Item = Word;
    type IntoIter = Words<'d>;

    fn into_iter(self) -> Self::IntoIter {
        self.words()
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn from_word_slice() {
        let words: &[u16] = &[0xABCD, 0xEF00, 0x1234];
        assert_eq!(
            Data::from_words(words, &mut [0; 5]).err(),
            Some(Error::BufferSize)
        );
        let buf = &mut [0xFF; 8];
        let data = Data::from_words(words, buf).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.payload(), &[0xAB, 0xCD, 0xEF, 0x00, 0x12, 0x34]);
    }

    #[test]
    fn from_empty_word_slice() {
        assert_eq!(
            Data::from_words(&[], &mut [0; 4]).err(),
            Some(Error::BufferSize)
        );
    }

    #[test]
    fn from_byte_slice() {
        let data = Data::from_bytes(&[0x11, 0x11, 0x22, 0x22]).unwrap();
        assert_eq!(data.len(), 2);
        assert!(Data::from_bytes(&[0x11, 0x11, 0x22]).is_err());
        assert!(Data::from_bytes(&[]).unwrap().is_empty());
    }

    #[test]
    fn copy_into_larger_buffer() {
        let data = Data::from_bytes(&[0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
        let buf = &mut [0; 6];
        data.copy_to(buf);
        assert_eq!(buf, &[0xAA, 0xBB, 0xCC, 0xDD, 0x00, 0x00]);
    }

    #[test]
    fn get_register() {
        let data = Data::from_bytes(&[0xFF, 0xAB, 0xCD, 0xEF]).unwrap();
        assert_eq!(data.get(0), Some(0xFFAB));
        assert_eq!(data.get(1), Some(0xCDEF));
        assert_eq!(data.get(2), None);
        assert_eq!(data.get(usize::MAX), None);
    }

    #[test]
    fn iterate_registers() {
        let data = Data::from_bytes(&[0x01, 0x02, 0x03, 0x04, 0xAA, 0xBB]).unwrap();
        let mut words = data.words();
        assert_eq!(words.len(), 3);
        assert_eq!(words.next(), Some(0x0102));
        assert_eq!(words.next_back(), Some(0xAABB));
        assert_eq!(words.next(), Some(0x0304));
        assert_eq!(words.next(), None);
        assert_eq!(words.next_back(), None);

        let mut sum = 0;
        for word in data {
            sum += u32::from(word);
        }
        assert_eq!(sum, 0x0102 + 0x0304 + 0xAABB);
    }
}
