// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Instruction/data cache control.
//!
//! The loader toggles caches as a bracket around every translation-table
//! mutation. The hardware forgets its autoload (prefetch) configuration on
//! disable, so the first disable of each domain captures the autoload
//! register and every enable writes it back, keeping hardware-default
//! prefetch behavior across the whole boot.

use boot_common::hil::{CacheControl, CacheDomain, MapTarget};
use boot_common::StaticRef;
use core::cell::Cell;
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};
use tock_registers::registers::{ReadOnly, ReadWrite};
use tock_registers::{register_bitfields, register_structs};

pub const EXTMEM_BASE: StaticRef<CacheRegisters> =
    unsafe { StaticRef::new(0x600C_4000 as *const CacheRegisters) };

register_structs! {
    pub CacheRegisters {
        (0x000 => icache_ctrl: ReadWrite<u32, CTRL::Register>),
        (0x004 => icache_autoload_ctrl: ReadWrite<u32>),
        (0x008 => dcache_ctrl: ReadWrite<u32, CTRL::Register>),
        (0x00C => dcache_autoload_ctrl: ReadWrite<u32>),
        (0x010 => bus_mask: ReadWrite<u32, BUS_MASK::Register>),
        (0x014 => cache_state: ReadOnly<u32, STATE::Register>),
        (0x018 => @END),
    }
}

register_bitfields![u32,
    CTRL [
        ENABLE OFFSET(0) NUMBITS(1) [],
    ],
    BUS_MASK [
        PRO_DROM0 OFFSET(0) NUMBITS(1) [],
        PRO_IROM0 OFFSET(1) NUMBITS(1) [],
        APP_DROM0 OFFSET(2) NUMBITS(1) [],
        APP_IROM0 OFFSET(3) NUMBITS(1) [],
    ],
    STATE [
        ICACHE_IDLE OFFSET(0) NUMBITS(1) [],
        DCACHE_IDLE OFFSET(1) NUMBITS(1) [],
    ],
];

pub struct Cache {
    registers: StaticRef<CacheRegisters>,
    icache_autoload: Cell<Option<u32>>,
    dcache_autoload: Cell<Option<u32>>,
}

impl Cache {
    pub const fn new(base: StaticRef<CacheRegisters>) -> Cache {
        Cache {
            registers: base,
            icache_autoload: Cell::new(None),
            dcache_autoload: Cell::new(None),
        }
    }

    fn disable_icache(&self) {
        if self.icache_autoload.get().is_none() {
            self.icache_autoload
                .set(Some(self.registers.icache_autoload_ctrl.get()));
        }
        self.registers.icache_ctrl.modify(CTRL::ENABLE::CLEAR);
        while !self.registers.cache_state.is_set(STATE::ICACHE_IDLE) {}
    }

    fn disable_dcache(&self) {
        if self.dcache_autoload.get().is_none() {
            self.dcache_autoload
                .set(Some(self.registers.dcache_autoload_ctrl.get()));
        }
        self.registers.dcache_ctrl.modify(CTRL::ENABLE::CLEAR);
        while !self.registers.cache_state.is_set(STATE::DCACHE_IDLE) {}
    }

    fn enable_icache(&self) {
        if let Some(autoload) = self.icache_autoload.get() {
            self.registers.icache_autoload_ctrl.set(autoload);
        }
        self.registers.icache_ctrl.modify(CTRL::ENABLE::SET);
    }

    fn enable_dcache(&self) {
        if let Some(autoload) = self.dcache_autoload.get() {
            self.registers.dcache_autoload_ctrl.set(autoload);
        }
        self.registers.dcache_ctrl.modify(CTRL::ENABLE::SET);
    }
}

impl CacheControl for Cache {
    fn disable(&self, domain: CacheDomain) {
        match domain {
            CacheDomain::Instruction => self.disable_icache(),
            CacheDomain::Data => self.disable_dcache(),
            CacheDomain::Both => {
                self.disable_icache();
                self.disable_dcache();
            }
        }
    }

    fn enable(&self, domain: CacheDomain) {
        match domain {
            CacheDomain::Instruction => self.enable_icache(),
            CacheDomain::Data => self.enable_dcache(),
            CacheDomain::Both => {
                self.enable_icache();
                self.enable_dcache();
            }
        }
    }

    fn enable_bus(&self, target: MapTarget) {
        // A set mask bit blocks the bus; mapped regions must be readable
        // from both CPUs.
        match target {
            MapTarget::ReadOnlyData => self
                .registers
                .bus_mask
                .modify(BUS_MASK::PRO_DROM0::CLEAR + BUS_MASK::APP_DROM0::CLEAR),
            MapTarget::Executable => self
                .registers
                .bus_mask
                .modify(BUS_MASK::PRO_IROM0::CLEAR + BUS_MASK::APP_IROM0::CLEAR),
        }
    }
}
