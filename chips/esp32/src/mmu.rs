// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Flash MMU translation table.
//!
//! 256 entries of one 64 KiB page each. Entries 0..64 translate the cached
//! read-only-data bus starting at virtual 0x3F40_0000; entries 64..128
//! translate the cached executable bus against virtual 0x4000_0000 (the
//! executable window itself starts at 0x400D_0000). Entry 0 doubles as the
//! scratch window before the permanent mappings are written.

use boot_common::hil::{EntryIndex, FlashMmu, MapTarget, VirtWindow};
use boot_common::StaticRef;
use tock_registers::interfaces::Writeable;
use tock_registers::registers::ReadWrite;
use tock_registers::{register_bitfields, register_structs};

pub const FLASH_MMU_TABLE: StaticRef<MmuRegisters> =
    unsafe { StaticRef::new(0x3FF1_0000 as *const MmuRegisters) };

/// Virtual address of the page backing [`FlashMmu::WINDOW_ENTRY`].
const WINDOW_VADDR: usize = 0x3F40_0000;

register_structs! {
    pub MmuRegisters {
        (0x000 => entries: [ReadWrite<u32, ENTRY::Register>; 256]),
        (0x400 => @END),
    }
}

register_bitfields![u32,
    ENTRY [
        PADDR OFFSET(0) NUMBITS(8) [],
        TARGET OFFSET(8) NUMBITS(1) [
            Drom = 0,
            Irom = 1,
        ],
        INVALID OFFSET(9) NUMBITS(1) [],
    ],
];

pub struct FlashMmuTable {
    registers: StaticRef<MmuRegisters>,
}

impl FlashMmuTable {
    pub const fn new(base: StaticRef<MmuRegisters>) -> FlashMmuTable {
        FlashMmuTable { registers: base }
    }
}

impl FlashMmu for FlashMmuTable {
    const PAGE_SIZE: usize = 0x1_0000;
    const ENTRY_COUNT: usize = 256;
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
        let target = match target {
            MapTarget::ReadOnlyData => ENTRY::TARGET::Drom,
            MapTarget::Executable => ENTRY::TARGET::Irom,
        };
        self.registers.entries[index.0].write(ENTRY::PADDR.val(phys_page) + target);
    }

    fn invalidate_all(&self) {
        for entry in self.registers.entries.iter() {
            entry.write(ENTRY::INVALID::SET);
        }
    }

    fn copy_from_window(&self, offset: usize, dst: &mut [u8]) {
        // The window page is trusted, unvalidated hardware-facing memory:
        // cached reads of whatever flash page the window entry points at.
        unsafe {
            core::ptr::copy_nonoverlapping(
                (WINDOW_VADDR + offset) as *const u8,
                dst.as_mut_ptr(),
                dst.len(),
            );
        }
    }
}
