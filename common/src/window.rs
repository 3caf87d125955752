// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Flash reads through a single reusable translation-table window.
//!
//! One fixed virtual page, [`FlashMmu::WINDOW_ENTRY`], backs every flash
//! read before the permanent mappings exist. The reader reprograms that one
//! entry only when a requested physical page differs from the resident one,
//! so consecutive reads within a page cost no cache toggles at all. Keeping
//! the window a single page keeps the reprogramming trivial; callers that
//! need more than a page worth of bytes loop via [`WindowReader::read_exact`].

use crate::hil::{CacheControl, CacheDomain, FlashMmu, MapTarget};
use core::cell::Cell;
use core::cmp;

pub struct WindowReader<'a, C: CacheControl, M: FlashMmu> {
    cache: &'a C,
    mmu: &'a M,
    /// Physical page currently resident in the window; `None` until the
    /// first read maps one.
    resident: Cell<Option<u32>>,
}

impl<'a, C: CacheControl, M: FlashMmu> WindowReader<'a, C, M> {
    pub fn new(cache: &'a C, mmu: &'a M) -> Self {
        WindowReader {
            cache,
            mmu,
            resident: Cell::new(None),
        }
    }

    /// Read from `flash_offset` into `dst`, returning the number of bytes
    /// actually copied: the request clamped to what remains of the
    /// containing page. Never crosses a page boundary in one call.
    pub fn read(&self, flash_offset: usize, dst: &mut [u8]) -> usize {
        let page = (flash_offset / M::PAGE_SIZE) as u32;
        let in_page = flash_offset % M::PAGE_SIZE;

        if self.resident.get() != Some(page) {
            // The data cache reads through the window entry, so it must be
            // off while the entry changes.
            self.cache.disable(CacheDomain::Data);
            self.mmu.set_entry(M::WINDOW_ENTRY, page, MapTarget::ReadOnlyData);
            self.cache.enable(CacheDomain::Data);
            self.resident.set(Some(page));
        }

        let len = cmp::min(dst.len(), M::PAGE_SIZE - in_page);
        self.mmu.copy_from_window(in_page, &mut dst[..len]);
        len
    }

    /// Fill all of `dst`, looping across page boundaries as needed.
    pub fn read_exact(&self, flash_offset: usize, dst: &mut [u8]) {
        let mut done = 0;
        while done < dst.len() {
            let n = self.read(flash_offset + done, &mut dst[done..]);
            done += n;
        }
    }
}
