// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Bootable image format: the fixed 24-byte header and the 8-byte segment
//! descriptors that follow it.
//!
//! Layout is little-endian and byte-exact. Segment descriptors and their
//! payload bytes are concatenated sequentially immediately after the header
//! and after each prior segment's payload, so the parser only ever needs a
//! forward-moving cursor.

use crate::error::BootError;
use crate::hil::{CacheControl, FlashMmu};
use crate::window::WindowReader;
use core::cell::Cell;

/// First byte of every valid image.
pub const IMAGE_MAGIC: u8 = 0xE9;

/// Hard limit on declared segments; also bounds the loader's bookkeeping.
pub const MAX_SEGMENTS: u8 = 16;

/// Size of [`ImageHeader`] on flash.
pub const HEADER_LEN: usize = 24;

/// Size of [`SegmentHeader`] on flash.
pub const SEGMENT_HEADER_LEN: usize = 8;

/// The fixed image header. Read once per boot, never mutated.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImageHeader {
    pub magic: u8,
    pub segment_count: u8,
    pub spi_mode: u8,
    /// Packed SPI speed (low nibble) and flash size (high nibble).
    pub spi_speed_size: u8,
    /// Virtual address control jumps to once every segment is placed.
    pub entry_addr: u32,
    pub wp_pin: u8,
    pub spi_pin_drv: [u8; 3],
    pub chip_id: u16,
    /// Whether a trailing integrity digest follows the last segment. The
    /// digest itself is never read at this boot stage.
    pub hash_appended: bool,
}

impl ImageHeader {
    /// Decode a header from its on-flash representation.
    pub fn parse(buf: &[u8; HEADER_LEN]) -> Result<ImageHeader, BootError> {
        if buf[0] != IMAGE_MAGIC {
            return Err(BootError::InvalidMagic);
        }
        if buf[1] > MAX_SEGMENTS {
            return Err(BootError::TooManySegments);
        }

        Ok(ImageHeader {
            magic: buf[0],
            segment_count: buf[1],
            spi_mode: buf[2],
            spi_speed_size: buf[3],
            entry_addr: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            wp_pin: buf[8],
            spi_pin_drv: [buf[9], buf[10], buf[11]],
            chip_id: u16::from_le_bytes([buf[12], buf[13]]),
            // buf[14..23] is reserved
            hash_appended: buf[23] != 0,
        })
    }

    pub fn spi_speed(&self) -> u8 {
        self.spi_speed_size & 0x0F
    }

    pub fn spi_size(&self) -> u8 {
        self.spi_speed_size >> 4
    }
}

/// One segment descriptor: where the payload must become visible and how
/// long it is. `load_addr` is a virtual address, not a flash offset.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SegmentHeader {
    pub load_addr: u32,
    pub data_len: u32,
}

impl SegmentHeader {
    pub fn parse(buf: &[u8; SEGMENT_HEADER_LEN]) -> SegmentHeader {
        SegmentHeader {
            load_addr: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            data_len: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        }
    }
}

/// Streaming image parser.
///
/// Reads through the scratch window and keeps a single forward cursor; it
/// never retains more than one decoded record at a time.
pub struct ImageParser<'a, C: CacheControl, M: FlashMmu> {
    window: &'a WindowReader<'a, C, M>,
    cursor: Cell<usize>,
}

impl<'a, C: CacheControl, M: FlashMmu> ImageParser<'a, C, M> {
    /// `image_offset` is the flash byte offset where the image begins.
    pub fn new(window: &'a WindowReader<'a, C, M>, image_offset: usize) -> Self {
        ImageParser {
            window,
            cursor: Cell::new(image_offset),
        }
    }

    /// Current flash byte offset: the start of whatever record or payload
    /// comes next.
    pub fn offset(&self) -> usize {
        self.cursor.get()
    }

    /// Skip `len` payload bytes without reading them.
    pub fn advance(&self, len: usize) {
        self.cursor.set(self.cursor.get() + len);
    }

    /// Read and validate the image header, leaving the cursor at the first
    /// segment descriptor. Fails before any segment is read.
    pub fn read_header(&self) -> Result<ImageHeader, BootError> {
        let mut buf = [0; HEADER_LEN];
        self.window.read_exact(self.cursor.get(), &mut buf);
        let header = ImageHeader::parse(&buf)?;
        self.advance(HEADER_LEN);
        Ok(header)
    }

    /// Read the next segment descriptor, leaving the cursor at the start of
    /// its payload. Must be called exactly `segment_count` times.
    pub fn next_segment(&self) -> SegmentHeader {
        let mut buf = [0; SEGMENT_HEADER_LEN];
        self.window.read_exact(self.cursor.get(), &mut buf);
        self.advance(SEGMENT_HEADER_LEN);
        SegmentHeader::parse(&buf)
    }
}
