// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Hosted tests against mock hardware.
//!
//! The mock enforces the cache-bracket invariant itself: it panics if a
//! translation entry is rewritten while the cache domain reading through it
//! is enabled, so every test doubles as a sequencing check.

use crate::error::BootError;
use crate::hil::{
    BootPlatform, CacheControl, CacheDomain, EntryIndex, FlashMmu, MapTarget, NullOut, Ram,
    VirtWindow,
};
use crate::image::{ImageHeader, ImageParser, SegmentHeader, HEADER_LEN};
use crate::mapper::map_region;
use crate::segment::PendingRegion;
use crate::sequencer::{BootSequencer, BootStage};
use crate::window::WindowReader;
use std::cell::{Cell, RefCell};

const PAGE: usize = 0x1_0000;
const ENTRIES: usize = 256;

/// Mock of the ESP32 boot hardware: flash contents in a `Vec`, the
/// translation table as an array, and counters for everything the tests
/// need to observe.
struct MockHw {
    flash: Vec<u8>,
    entries: RefCell<[Option<(u32, MapTarget)>; ENTRIES]>,
    entry_log: RefCell<Vec<(usize, u32)>>,
    entry_writes: Cell<usize>,
    icache_on: Cell<bool>,
    dcache_on: Cell<bool>,
    cache_toggles: Cell<usize>,
    drom_bus: Cell<bool>,
    irom_bus: Cell<bool>,
    ram_writes: RefCell<Vec<(u32, Vec<u8>)>>,
    zeroed: RefCell<Vec<(u32, usize)>>,
    watchdogs_quiesced: Cell<bool>,
}

impl MockHw {
    fn new(flash: Vec<u8>) -> Self {
        MockHw {
            flash,
            entries: RefCell::new([None; ENTRIES]),
            entry_log: RefCell::new(Vec::new()),
            entry_writes: Cell::new(0),
            icache_on: Cell::new(true),
            dcache_on: Cell::new(true),
            cache_toggles: Cell::new(0),
            drom_bus: Cell::new(false),
            irom_bus: Cell::new(false),
            ram_writes: RefCell::new(Vec::new()),
            zeroed: RefCell::new(Vec::new()),
            watchdogs_quiesced: Cell::new(false),
        }
    }

    /// All RAM bytes written, flattened in write order.
    fn ram_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (_, bytes) in self.ram_writes.borrow().iter() {
            out.extend_from_slice(bytes);
        }
        out
    }
}

impl CacheControl for MockHw {
    fn disable(&self, domain: CacheDomain) {
        match domain {
            CacheDomain::Instruction => self.icache_on.set(false),
            CacheDomain::Data => self.dcache_on.set(false),
            CacheDomain::Both => {
                self.icache_on.set(false);
                self.dcache_on.set(false);
            }
        }
        self.cache_toggles.set(self.cache_toggles.get() + 1);
    }

    fn enable(&self, domain: CacheDomain) {
        match domain {
            CacheDomain::Instruction => self.icache_on.set(true),
            CacheDomain::Data => self.dcache_on.set(true),
            CacheDomain::Both => {
                self.icache_on.set(true);
                self.dcache_on.set(true);
            }
        }
        self.cache_toggles.set(self.cache_toggles.get() + 1);
    }

    fn enable_bus(&self, target: MapTarget) {
        match target {
            MapTarget::ReadOnlyData => self.drom_bus.set(true),
            MapTarget::Executable => self.irom_bus.set(true),
        }
    }
}

impl FlashMmu for MockHw {
    const PAGE_SIZE: usize = PAGE;
    const ENTRY_COUNT: usize = ENTRIES;
    const WINDOW_ENTRY: EntryIndex = EntryIndex(0);
    const DROM: VirtWindow = VirtWindow {
        start: 0x3F40_0000,
        end: 0x3F80_0000,
        entry_base: 0,
        translation_base: 0x3F40_0000,
    };
    const IROM: VirtWindow = VirtWindow {
        start: 0x400D_0000,
        end: 0x4040_0000,
        entry_base: 64,
        translation_base: 0x4000_0000,
    };

    fn set_entry(&self, index: EntryIndex, phys_page: u32, target: MapTarget) {
        // The invariant from the data model: an entry must never change
        // while a cache domain that reads through it is enabled.
        match target {
            MapTarget::ReadOnlyData => {
                assert!(!self.dcache_on.get(), "entry rewrite with data cache on")
            }
            MapTarget::Executable => {
                assert!(
                    !self.icache_on.get(),
                    "entry rewrite with instruction cache on"
                )
            }
        }
        self.entries.borrow_mut()[index.0] = Some((phys_page, target));
        self.entry_log.borrow_mut().push((index.0, phys_page));
        self.entry_writes.set(self.entry_writes.get() + 1);
    }

    fn invalidate_all(&self) {
        assert!(
            !self.icache_on.get() && !self.dcache_on.get(),
            "table invalidation with caches on"
        );
        *self.entries.borrow_mut() = [None; ENTRIES];
    }

    fn copy_from_window(&self, offset: usize, dst: &mut [u8]) {
        assert!(self.dcache_on.get(), "window read with data cache off");
        let (page, _) = self.entries.borrow()[Self::WINDOW_ENTRY.0]
            .expect("window read through invalid entry");
        let base = page as usize * PAGE + offset;
        dst.copy_from_slice(&self.flash[base..base + dst.len()]);
    }
}

impl Ram for MockHw {
    fn copy_to(&self, addr: u32, bytes: &[u8]) {
        self.ram_writes.borrow_mut().push((addr, bytes.to_vec()));
    }

    fn zero(&self, addr: u32, len: usize) {
        self.zeroed.borrow_mut().push((addr, len));
    }
}

impl BootPlatform for MockHw {
    fn quiesce_watchdogs(&self) {
        self.watchdogs_quiesced.set(true);
    }
}

/// Assemble an image: header, then each segment's descriptor and payload
/// back to back.
fn build_image(entry_addr: u32, segments: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(0xE9);
    out.push(segments.len() as u8);
    out.push(0x02); // spi_mode
    out.push(0x2F); // spi_speed = 0xF, spi_size = 0x2
    out.extend_from_slice(&entry_addr.to_le_bytes());
    out.push(0xEE); // wp_pin
    out.extend_from_slice(&[1, 2, 3]); // spi_pin_drv
    out.extend_from_slice(&7u16.to_le_bytes()); // chip_id
    out.extend_from_slice(&[0; 9]); // reserved
    out.push(1); // hash_appended
    assert_eq!(out.len(), HEADER_LEN);

    for (load_addr, data) in segments {
        out.extend_from_slice(&load_addr.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
    }
    out
}

fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + 3) as u8).collect()
}

fn sequencer<'a>(
    hw: &'a MockHw,
    diag: &'a NullOut,
) -> BootSequencer<'a, MockHw, MockHw, MockHw, MockHw, NullOut> {
    BootSequencer::new(hw, hw, hw, hw, diag, 0, Some((0x3FFE_0000, 0x4000)))
}

mod header {
    use super::*;

    #[test]
    fn parse_header_fields() {
        let image = build_image(0x4008_1000, &[]);
        let mut buf = [0; HEADER_LEN];
        buf.copy_from_slice(&image[..HEADER_LEN]);

        let header = ImageHeader::parse(&buf).unwrap();
        assert_eq!(header.magic, 0xE9);
        assert_eq!(header.segment_count, 0);
        assert_eq!(header.spi_mode, 0x02);
        assert_eq!(header.spi_speed(), 0xF);
        assert_eq!(header.spi_size(), 0x2);
        assert_eq!(header.entry_addr, 0x4008_1000);
        assert_eq!(header.wp_pin, 0xEE);
        assert_eq!(header.spi_pin_drv, [1, 2, 3]);
        assert_eq!(header.chip_id, 7);
        assert!(header.hash_appended);
    }

    #[test]
    fn parse_header_through_flash_window() {
        let hw = MockHw::new(build_image(0x4000_1234, &[]));
        hw.disable(CacheDomain::Both);
        hw.invalidate_all();
        let window = WindowReader::new(&hw, &hw);
        let parser = ImageParser::new(&window, 0);

        let header = parser.read_header().unwrap();
        assert_eq!(header.entry_addr, 0x4000_1234);
        assert_eq!(parser.offset(), HEADER_LEN);
    }

    #[test]
    fn reject_invalid_magic() {
        let mut image = build_image(0x4008_1000, &[]);
        image[0] = 0xAA;
        let mut buf = [0; HEADER_LEN];
        buf.copy_from_slice(&image[..HEADER_LEN]);
        assert_eq!(ImageHeader::parse(&buf), Err(BootError::InvalidMagic));
    }

    #[test]
    fn reject_too_many_segments() {
        let mut image = build_image(0x4008_1000, &[]);
        image[1] = 17;
        let mut buf = [0; HEADER_LEN];
        buf.copy_from_slice(&image[..HEADER_LEN]);
        assert_eq!(ImageHeader::parse(&buf), Err(BootError::TooManySegments));
    }

    #[test]
    fn invalid_magic_halts_before_any_segment() {
        let mut image = build_image(0x4008_1000, &[(0x3FFB_0000, patterned(64))]);
        image[0] = 0x00;
        let hw = MockHw::new(image);
        let diag = NullOut;
        let boot = sequencer(&hw, &diag);

        assert_eq!(boot.run().unwrap_err(), BootError::InvalidMagic);
        assert_eq!(boot.stage(), BootStage::TableInvalidated);
        assert!(hw.ram_writes.borrow().is_empty());
    }
}

mod window {
    use super::*;

    #[test]
    fn read_clamps_to_page_end() {
        let hw = MockHw::new(patterned(2 * PAGE));
        hw.disable(CacheDomain::Both);
        hw.invalidate_all();
        let window = WindowReader::new(&hw, &hw);

        let mut buf = [0; 64];
        assert_eq!(window.read(0xFFF0, &mut buf), 16);
        assert_eq!(&buf[..16], &patterned(2 * PAGE)[0xFFF0..PAGE]);

        let mut small = [0; 7];
        assert_eq!(window.read(5, &mut small), 7);
        assert_eq!(&small[..], &patterned(16)[5..12]);
    }

    #[test]
    fn read_reuses_resident_page() {
        let hw = MockHw::new(patterned(2 * PAGE));
        hw.disable(CacheDomain::Both);
        hw.invalidate_all();
        let window = WindowReader::new(&hw, &hw);

        let mut buf = [0; 16];
        window.read(0x100, &mut buf);
        let writes = hw.entry_writes.get();
        let toggles = hw.cache_toggles.get();

        // Same page: no entry rewrite, no cache toggling.
        window.read(0x8000, &mut buf);
        assert_eq!(hw.entry_writes.get(), writes);
        assert_eq!(hw.cache_toggles.get(), toggles);

        // Different page: exactly one rewrite inside one disable/enable pair.
        window.read(PAGE + 0x100, &mut buf);
        assert_eq!(hw.entry_writes.get(), writes + 1);
        assert_eq!(hw.cache_toggles.get(), toggles + 2);
    }

    #[test]
    fn read_exact_crosses_pages() {
        let flash = patterned(2 * PAGE);
        let hw = MockHw::new(flash.clone());
        hw.disable(CacheDomain::Both);
        hw.invalidate_all();
        let window = WindowReader::new(&hw, &hw);

        let mut buf = vec![0; 100];
        window.read_exact(PAGE - 40, &mut buf);
        assert_eq!(&buf[..], &flash[PAGE - 40..PAGE + 60]);
    }
}

mod mapper {
    use super::*;

    fn region(flash_offset: usize, load_addr: u32, data_len: u32) -> PendingRegion {
        PendingRegion::new(
            flash_offset,
            SegmentHeader {
                load_addr,
                data_len,
            },
        )
    }

    #[test]
    fn single_page_for_skewed_segment() {
        let hw = MockHw::new(Vec::new());
        hw.disable(CacheDomain::Both);

        // ceil((37104 + 0x20) / 0x10000) = 1
        let pages = map_region(
            &hw,
            &hw,
            &region(0x20, 0x3F40_0020, 37104),
            MapTarget::ReadOnlyData,
        )
        .unwrap();
        assert_eq!(pages, 1);
        assert_eq!(&*hw.entry_log.borrow(), &[(0, 0)]);
        assert!(hw.drom_bus.get());
    }

    #[test]
    fn consecutive_entries_consecutive_pages() {
        let hw = MockHw::new(Vec::new());
        hw.disable(CacheDomain::Both);

        // Payload starts 0x9118 into flash page 0 and needs 3 pages.
        let pages = map_region(
            &hw,
            &hw,
            &region(0x9118, 0x400D_9118, 103416),
            MapTarget::Executable,
        )
        .unwrap();
        assert_eq!(pages, 3);
        assert_eq!(&*hw.entry_log.borrow(), &[(77, 0), (78, 1), (79, 2)]);
        assert!(hw.irom_bus.get());
    }

    #[test]
    fn mapping_is_idempotent() {
        let hw = MockHw::new(Vec::new());
        hw.disable(CacheDomain::Both);
        let r = region(0x2_0020, 0x400D_0020, 150000);

        map_region(&hw, &hw, &r, MapTarget::Executable).unwrap();
        let first: Vec<(usize, u32)> = hw.entry_log.borrow().clone();
        hw.entry_log.borrow_mut().clear();
        map_region(&hw, &hw, &r, MapTarget::Executable).unwrap();

        assert_eq!(&*hw.entry_log.borrow(), &first);
    }

    #[test]
    fn rejects_table_overflow() {
        let hw = MockHw::new(Vec::new());
        hw.disable(CacheDomain::Both);

        // Entry 127 plus 130 pages runs past the 256-entry table.
        let err = map_region(
            &hw,
            &hw,
            &region(0, 0x403F_0000, 130 * PAGE as u32),
            MapTarget::Executable,
        )
        .unwrap_err();
        assert_eq!(err, BootError::TableExhausted);
        assert!(hw.entry_log.borrow().is_empty());
    }

    #[test]
    fn rejects_region_overrunning_its_window() {
        let hw = MockHw::new(Vec::new());
        hw.disable(CacheDomain::Both);

        // 70 pages fit in the table but not in the read-only-data window's
        // 64 entries; accepting this would overwrite executable entries.
        let err = map_region(
            &hw,
            &hw,
            &region(0, 0x3F40_0000, 70 * PAGE as u32),
            MapTarget::ReadOnlyData,
        )
        .unwrap_err();
        assert_eq!(err, BootError::TableExhausted);
        assert!(hw.entry_log.borrow().is_empty());
    }

    #[test]
    #[should_panic(expected = "load address outside the window")]
    fn mismatched_target_is_rejected() {
        let hw = MockHw::new(Vec::new());
        hw.disable(CacheDomain::Both);

        // Read-only-data load address handed the executable target.
        let _ = map_region(
            &hw,
            &hw,
            &region(0, 0x3F40_0000, 64),
            MapTarget::Executable,
        );
    }
}

mod boot {
    use super::*;

    #[test]
    fn padding_segment_advances_cursor_without_ram_writes() {
        // If the padding segment's 16 bytes were not skipped exactly, the
        // following immediate segment would stream garbage.
        let payload = patterned(300);
        let image = build_image(
            0x4008_0400,
            &[(0, patterned(16)), (0x3FFB_0000, payload.clone())],
        );
        let hw = MockHw::new(image);
        let diag = NullOut;
        sequencer(&hw, &diag).run().unwrap();

        assert_eq!(hw.ram_bytes(), payload);
        assert_eq!(hw.ram_writes.borrow()[0].0, 0x3FFB_0000);
    }

    #[test]
    fn immediate_segment_streams_across_pages() {
        let payload = patterned(70000);
        let image = build_image(0x4008_0400, &[(0x3FFB_0000, payload.clone())]);
        let hw = MockHw::new(image);
        let diag = NullOut;
        sequencer(&hw, &diag).run().unwrap();

        assert_eq!(hw.ram_bytes(), payload);
        // Destination addresses are contiguous from the load address.
        let mut expected_addr = 0x3FFB_0000u32;
        for (addr, bytes) in hw.ram_writes.borrow().iter() {
            assert_eq!(*addr, expected_addr);
            expected_addr += bytes.len() as u32;
        }
    }

    #[test]
    fn later_region_of_same_class_replaces_earlier() {
        // Two read-only-data segments: only the later one may end up in the
        // table. Last-wins is the documented behavior, not an accident.
        let image = build_image(
            0x4008_0400,
            &[(0x3F40_0020, patterned(64)), (0x3F41_0068, patterned(128))],
        );
        let hw = MockHw::new(image);
        let diag = NullOut;
        sequencer(&hw, &diag).run().unwrap();

        let entries = hw.entries.borrow();
        // Second segment: payload at flash 104, aligned vaddr 0x3F41_0000.
        assert_eq!(entries[1], Some((0, MapTarget::ReadOnlyData)));
        // First segment's entry (index 0) was never mapped.
        assert_eq!(entries[0], None);
    }

    #[test]
    fn full_boot_scenario() {
        let image = build_image(
            0x4000_0020,
            &[
                (0x3F40_0020, patterned(37104)),
                (0x400D_0020, patterned(103416)),
                (0, patterned(16)),
            ],
        );
        let hw = MockHw::new(image);
        let diag = NullOut;
        let boot = sequencer(&hw, &diag);

        let loaded = boot.run().unwrap();
        assert_eq!(loaded.entry_addr(), 0x4000_0020);
        assert_eq!(boot.stage(), BootStage::Dispatched);

        // Deferred segments were mapped, nothing was copied to RAM.
        assert!(hw.ram_writes.borrow().is_empty());
        let entries = hw.entries.borrow();
        // Segment 0: payload at flash 0x20, one page at entry 0.
        assert_eq!(entries[0], Some((0, MapTarget::ReadOnlyData)));
        // Segment 1: payload at flash 37144, three pages starting at the
        // executable window's entry for 0x400D_0000.
        assert_eq!(entries[77], Some((0, MapTarget::Executable)));
        assert_eq!(entries[78], Some((1, MapTarget::Executable)));
        assert_eq!(entries[79], Some((2, MapTarget::Executable)));
        for (i, entry) in entries.iter().enumerate() {
            if ![0, 77, 78, 79].contains(&i) {
                assert_eq!(*entry, None, "unexpected entry at {}", i);
            }
        }

        // Caches and buses are live on exit, watchdogs were quiesced, and
        // the uninitialized RAM range was cleared.
        assert!(hw.icache_on.get() && hw.dcache_on.get());
        assert!(hw.drom_bus.get() && hw.irom_bus.get());
        assert!(hw.watchdogs_quiesced.get());
        assert_eq!(&*hw.zeroed.borrow(), &[(0x3FFE_0000, 0x4000)]);
    }
}
