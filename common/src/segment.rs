// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Segment classification and the immediate-copy path.
//!
//! Every segment takes one of three routes based purely on its declared
//! load address: defer-and-batch-map for the two cached flash windows, or
//! stream-copy-now for everything else. A zero load address is padding that
//! exists only to keep segment framing aligned; it carries no payload worth
//! copying.

use crate::hil::{CacheControl, FlashMmu, Ram};
use crate::image::SegmentHeader;
use crate::window::WindowReader;
use core::cmp;

/// Bounce buffer size for flash-to-RAM streaming.
const COPY_CHUNK: usize = 256;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SegmentClass {
    /// Load address falls in the cached read-only-data window; defer.
    ReadOnlyData,
    /// Load address falls in the cached executable window; defer.
    Executable,
    /// Anything else, including address zero; handle right now.
    Immediate,
}

/// Route a segment by range-testing its load address against the two fixed,
/// non-overlapping cached windows.
pub fn classify<M: FlashMmu>(load_addr: u32) -> SegmentClass {
    if M::DROM.contains(load_addr) {
        SegmentClass::ReadOnlyData
    } else if M::IROM.contains(load_addr) {
        SegmentClass::Executable
    } else {
        SegmentClass::Immediate
    }
}

/// A deferred segment: where its payload starts on flash, plus its
/// descriptor. At most one exists per mapped class at a time; a later
/// segment of the same class replaces an earlier one.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PendingRegion {
    pub flash_offset: usize,
    pub segment: SegmentHeader,
}

impl PendingRegion {
    pub fn new(flash_offset: usize, segment: SegmentHeader) -> Self {
        PendingRegion {
            flash_offset,
            segment,
        }
    }
}

/// Stream a segment payload from flash into RAM, looping on the window
/// reader until every byte is delivered.
pub fn stream_copy<C: CacheControl, M: FlashMmu, R: Ram>(
    window: &WindowReader<C, M>,
    ram: &R,
    flash_offset: usize,
    load_addr: u32,
    data_len: u32,
) {
    let mut chunk = [0; COPY_CHUNK];
    let mut copied = 0;
    while copied < data_len as usize {
        let want = cmp::min(COPY_CHUNK, data_len as usize - copied);
        let n = window.read(flash_offset + copied, &mut chunk[..want]);
        ram.copy_to(load_addr + copied as u32, &chunk[..n]);
        copied += n;
    }
}
