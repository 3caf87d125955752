// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Top-level boot orchestration.
//!
//! [`BootSequencer::run`] drives the whole load as a straight-line state
//! machine and returns a sum-typed result the caller matches on exactly
//! once:
//!
//! ```ignore
//! match sequencer.run() {
//!     Ok(image) => unsafe { image.dispatch() },
//!     Err(_) => {
//!         diag.line("boot: invalid image, halting");
//!         halt();
//!     }
//! }
//! ```
//!
//! Execution is single-threaded and non-preemptive; nothing yields between
//! a cache disable and its matching enable, which is the only locking
//! discipline the translation table needs.

use crate::error::BootError;
use crate::hil::{
    BootPlatform, CacheControl, CacheDomain, DiagnosticOut, FlashMmu, MapTarget, Ram,
};
use crate::image::ImageParser;
use crate::mapper::map_region;
use crate::segment::{classify, stream_copy, PendingRegion, SegmentClass};
use crate::window::WindowReader;
use core::cell::Cell;

/// Progress marker for the boot state machine. Terminal success is
/// `Dispatched`; the only terminal failure is the caller's halt loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BootStage {
    Init,
    CachesQuiesced,
    TableInvalidated,
    HeaderValid,
    SegmentsProcessed,
    RegionsMapped,
    CachesRestored,
    Dispatched,
}

/// A fully placed image, ready to run.
#[derive(Debug)]
pub struct LoadedImage {
    entry_addr: u32,
}

impl LoadedImage {
    pub fn entry_addr(&self) -> u32 {
        self.entry_addr
    }

    /// Transfer control to the image. Never returns.
    ///
    /// ## Safety
    ///
    /// The entry address came from the image header; calling it is only
    /// sound once `run` has placed every segment and restored the caches.
    pub unsafe fn dispatch(self) -> ! {
        let entry: extern "C" fn() -> ! = core::mem::transmute(self.entry_addr as usize);
        entry()
    }
}

/// Spin forever. No recovery is possible this early; the only way out is an
/// external reset. Interrupts are left in whatever state they were in.
pub fn halt() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

pub struct BootSequencer<'a, C, M, R, P, D>
where
    C: CacheControl,
    M: FlashMmu,
    R: Ram,
    P: BootPlatform,
    D: DiagnosticOut,
{
    cache: &'a C,
    mmu: &'a M,
    ram: &'a R,
    platform: &'a P,
    diag: &'a D,
    /// Flash byte offset where the image begins.
    image_offset: usize,
    /// Uninitialized-RAM range to clear before loading, if any.
    bss: Option<(u32, u32)>,
    stage: Cell<BootStage>,
}

impl<'a, C, M, R, P, D> BootSequencer<'a, C, M, R, P, D>
where
    C: CacheControl,
    M: FlashMmu,
    R: Ram,
    P: BootPlatform,
    D: DiagnosticOut,
{
    pub fn new(
        cache: &'a C,
        mmu: &'a M,
        ram: &'a R,
        platform: &'a P,
        diag: &'a D,
        image_offset: usize,
        bss: Option<(u32, u32)>,
    ) -> Self {
        BootSequencer {
            cache,
            mmu,
            ram,
            platform,
            diag,
            image_offset,
            bss,
            stage: Cell::new(BootStage::Init),
        }
    }

    pub fn stage(&self) -> BootStage {
        self.stage.get()
    }

    /// Run the whole load. On success the image is placed, the table is
    /// populated, caches are enabled, and the returned entry address is
    /// ready to call. Any error is fatal; the caller halts.
    pub fn run(&self) -> Result<LoadedImage, BootError> {
        self.platform.quiesce_watchdogs();
        if let Some((start, len)) = self.bss {
            self.ram.zero(start, len as usize);
        }
        self.cache.disable(CacheDomain::Both);
        self.stage.set(BootStage::CachesQuiesced);

        self.mmu.invalidate_all();
        self.stage.set(BootStage::TableInvalidated);

        let window = WindowReader::new(self.cache, self.mmu);
        let parser = ImageParser::new(&window, self.image_offset);

        let header = parser.read_header()?;
        self.stage.set(BootStage::HeaderValid);
        self.diag.line("boot: image header ok");

        let mut pending_rodata: Option<PendingRegion> = None;
        let mut pending_text: Option<PendingRegion> = None;

        for _ in 0..header.segment_count {
            let segment = parser.next_segment();
            match classify::<M>(segment.load_addr) {
                SegmentClass::ReadOnlyData => {
                    // Last one wins; images carry at most one per class.
                    pending_rodata = Some(PendingRegion::new(parser.offset(), segment));
                }
                SegmentClass::Executable => {
                    pending_text = Some(PendingRegion::new(parser.offset(), segment));
                }
                SegmentClass::Immediate => {
                    if segment.load_addr != 0 {
                        stream_copy(
                            &window,
                            self.ram,
                            parser.offset(),
                            segment.load_addr,
                            segment.data_len,
                        );
                    }
                    // Address zero is padding: skip the payload untouched.
                }
            }
            parser.advance(segment.data_len as usize);
        }
        self.stage.set(BootStage::SegmentsProcessed);

        // The window entry is garbage from here on; wipe the table and
        // write the permanent mappings under one cache bracket instead of
        // one per map call.
        self.cache.disable(CacheDomain::Both);
        self.mmu.invalidate_all();
        if let Some(region) = pending_rodata.as_ref() {
            map_region(self.cache, self.mmu, region, MapTarget::ReadOnlyData)?;
        }
        if let Some(region) = pending_text.as_ref() {
            map_region(self.cache, self.mmu, region, MapTarget::Executable)?;
        }
        self.stage.set(BootStage::RegionsMapped);

        self.cache.enable(CacheDomain::Both);
        self.stage.set(BootStage::CachesRestored);

        self.diag.line("boot: dispatching to image");
        self.stage.set(BootStage::Dispatched);
        Ok(LoadedImage {
            entry_addr: header.entry_addr,
        })
    }
}
