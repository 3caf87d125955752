// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Hardware interfaces consumed by the boot core.
//!
//! A chip crate implements these traits over memory mapped registers; the
//! hosted tests implement them over plain buffers. Every translation-table
//! mutation in this crate is bracketed by [`CacheControl::disable`] /
//! [`CacheControl::enable`] on the domain that reads through the mutated
//! entry. Speculative fetch through an enabled cache can race a table write
//! on the same core, so skipping a bracket is a correctness bug, not a
//! performance one.

/// One independently controllable cache, or both at once.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CacheDomain {
    Instruction,
    Data,
    Both,
}

/// Memory class a translation entry serves: the cached read-only-data bus
/// or the cached executable bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MapTarget {
    ReadOnlyData,
    Executable,
}

/// Bounds-checked index into the flash translation table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EntryIndex(pub usize);

/// A fixed virtual address window served by the translation table.
///
/// `entry_base` and `translation_base` together give the deterministic
/// virtual-address-to-entry function: the entry for `vaddr` is
/// `entry_base + (vaddr - translation_base) / PAGE_SIZE`.
pub struct VirtWindow {
    /// First virtual address inside the window.
    pub start: u32,
    /// First virtual address past the window.
    pub end: u32,
    /// Translation entry index the bus translates against.
    pub entry_base: usize,
    /// Virtual address the bus translates against. Not necessarily `start`:
    /// a window may begin partway into its bus range.
    pub translation_base: u32,
}

impl VirtWindow {
    pub const fn contains(&self, addr: u32) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// Instruction/data cache control.
///
/// Between a `disable(x)` and the matching `enable(x)` the translation table
/// may be freely rewritten for ranges served by `x`. `disable` must be
/// idempotent and must capture the domain's autoload configuration the first
/// time it runs; `enable` restores that configuration so hardware-default
/// prefetch behavior survives every bracket. These are register-level
/// operations with no error path.
pub trait CacheControl {
    fn disable(&self, domain: CacheDomain);
    fn enable(&self, domain: CacheDomain);

    /// Unmask the cache bus serving `target`'s virtual range for every
    /// execution context that will read it. Called once per mapped region,
    /// after its entries are written.
    fn enable_bus(&self, target: MapTarget);
}

/// The flash translation table plus the single scratch window backing
/// arbitrary flash reads.
pub trait FlashMmu {
    /// Bytes covered by one translation entry.
    const PAGE_SIZE: usize;
    /// Total number of translation entries.
    const ENTRY_COUNT: usize;
    /// The entry backing the reusable scratch window.
    const WINDOW_ENTRY: EntryIndex;
    /// Cached read-only-data window.
    const DROM: VirtWindow;
    /// Cached executable window.
    const IROM: VirtWindow;

    /// Point `index` at physical flash page `phys_page`, valid, serving
    /// `target`. Caller must have disabled the cache domain reading through
    /// this entry.
    fn set_entry(&self, index: EntryIndex, phys_page: u32, target: MapTarget);

    /// Mark every entry invalid. Caller must have disabled both caches.
    fn invalidate_all(&self);

    /// Copy `dst.len()` bytes from the scratch window, starting `offset`
    /// bytes into the currently resident page. Caller guarantees the window
    /// entry is valid and the copy does not run off the page.
    fn copy_from_window(&self, offset: usize, dst: &mut [u8]);

    /// Translation entry for a virtual address, or `None` if the address is
    /// outside both cached windows.
    fn entry_for(vaddr: u32) -> Option<EntryIndex> {
        let (entry_base, translation_base) = if Self::DROM.contains(vaddr) {
            (Self::DROM.entry_base, Self::DROM.translation_base)
        } else if Self::IROM.contains(vaddr) {
            (Self::IROM.entry_base, Self::IROM.translation_base)
        } else {
            return None;
        };
        Some(EntryIndex(
            entry_base + (vaddr - translation_base) as usize / Self::PAGE_SIZE,
        ))
    }
}

/// Raw writes into RAM load targets.
///
/// Addresses come straight from segment descriptors and are trusted,
/// unvalidated hardware-facing memory: they are not objects known to the
/// Rust allocation model, and nothing here checks that they point at RAM.
pub trait Ram {
    fn copy_to(&self, addr: u32, bytes: &[u8]);
    fn zero(&self, addr: u32, len: usize);
}

/// The out-of-scope platform services the sequencer calls before touching
/// flash.
pub trait BootPlatform {
    /// Disable every watchdog that could fire during the load, including
    /// flash-boot protection timers.
    fn quiesce_watchdogs(&self);
}

/// Best-effort diagnostic output. Absent on some builds.
pub trait DiagnosticOut {
    fn line(&self, s: &str);
}

/// Diagnostic sink for builds without a console.
pub struct NullOut;

impl DiagnosticOut for NullOut {
    fn line(&self, _s: &str) {}
}
