// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Permanent execute-in-place mappings for deferred segments.
//!
//! A deferred segment rarely starts page-aligned on flash: its payload sits
//! `flash_offset % PAGE_SIZE` bytes into the first containing page, and the
//! build lays the image out so the same skew appears in the load address.
//! Mapping therefore rounds the virtual base down to a page boundary and
//! covers `data_len` plus the skew with consecutive entries. Consecutive
//! physical pages are correct because the image was laid out contiguously
//! at build time.

use crate::error::BootError;
use crate::hil::{CacheControl, EntryIndex, FlashMmu, MapTarget};
use crate::segment::PendingRegion;

/// Write every translation entry one deferred region needs, then unmask the
/// cache bus serving its virtual range.
///
/// Pure given its inputs: mapping the same region twice writes identical
/// entries. Preconditions: the caller has already disabled the caches for
/// the whole mapping phase (no cache toggles happen here), and `target`
/// matches the window containing the region's load address.
pub fn map_region<C: CacheControl, M: FlashMmu>(
    cache: &C,
    mmu: &M,
    region: &PendingRegion,
    target: MapTarget,
) -> Result<usize, BootError> {
    let skew = region.flash_offset % M::PAGE_SIZE;
    let aligned_vaddr = region.segment.load_addr & !((M::PAGE_SIZE - 1) as u32);
    let page_count =
        (region.segment.data_len as usize + skew + M::PAGE_SIZE - 1) / M::PAGE_SIZE;

    let (entry_base, translation_base, window_end, in_window) = match target {
        MapTarget::ReadOnlyData => (
            M::DROM.entry_base,
            M::DROM.translation_base,
            M::DROM.end,
            M::DROM.contains(region.segment.load_addr),
        ),
        MapTarget::Executable => (
            M::IROM.entry_base,
            M::IROM.translation_base,
            M::IROM.end,
            M::IROM.contains(region.segment.load_addr),
        ),
    };
    debug_assert!(in_window, "load address outside the window for its target");

    let first = entry_base + (aligned_vaddr - translation_base) as usize / M::PAGE_SIZE;
    // Each window owns a fixed slice of the table; a region that runs past
    // its own window's entries must not spill into the other bus's slice.
    let entry_limit = entry_base + (window_end - translation_base) as usize / M::PAGE_SIZE;
    if first + page_count > entry_limit {
        return Err(BootError::TableExhausted);
    }

    let mut phys_page = (region.flash_offset / M::PAGE_SIZE) as u32;
    for i in 0..page_count {
        mmu.set_entry(EntryIndex(first + i), phys_page, target);
        phys_page += 1;
    }

    cache.enable_bus(target);
    Ok(page_count)
}
