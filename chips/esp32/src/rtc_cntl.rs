// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! RTC watchdog control.
//!
//! Only the watchdog portion of the RTC_CNTL block is mapped: the loader's
//! sole interest here is making sure neither the RTC watchdog nor the super
//! watchdog resets the chip mid-load.

use boot_common::StaticRef;
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};
use tock_registers::registers::ReadWrite;
use tock_registers::{register_bitfields, register_structs};

pub const RTC_CNTL_BASE: StaticRef<RtcCntlRegisters> =
    unsafe { StaticRef::new(0x6000_8000 as *const RtcCntlRegisters) };

register_structs! {
    pub RtcCntlRegisters {
        (0x000 => _reserved0),
        (0x090 => wdtconfig0: ReadWrite<u32, WDTCONFIG0::Register>),
        (0x094 => wdtconfig1: ReadWrite<u32>),
        (0x098 => wdtconfig2: ReadWrite<u32>),
        (0x09C => wdtconfig3: ReadWrite<u32>),
        (0x0A0 => wdtconfig4: ReadWrite<u32>),
        (0x0A4 => wdtfeed: ReadWrite<u32>),
        (0x0A8 => wdtprotect: ReadWrite<u32>),
        (0x0AC => swd_conf: ReadWrite<u32, SWD_CONF::Register>),
        (0x0B0 => swd_wprotect: ReadWrite<u32>),
        (0x0B4 => _reserved1),
        (0x10C => fib_sel: ReadWrite<u32, FIB_SEL::Register>),
        (0x110 => @END),
    }
}

register_bitfields![u32,
    WDTCONFIG0 [
        CHIP_RESET_EN OFFSET(8) NUMBITS(1) [],
        PAUSE_INSLEEP OFFSET(9) NUMBITS(1) [],
        APPCPU_RESET_EN OFFSET(10) NUMBITS(1) [],
        PROCPU_RESET_EN OFFSET(11) NUMBITS(1) [],
        FLASHBOOT_MOD_EN OFFSET(12) NUMBITS(1) [],
        SYS_RESET_LENGTH OFFSET(13) NUMBITS(3) [],
        CPU_RESET_LENGTH OFFSET(16) NUMBITS(3) [],
        STG3 OFFSET(19) NUMBITS(3) [],
        STG2 OFFSET(22) NUMBITS(3) [],
        STG1 OFFSET(25) NUMBITS(3) [],
        STG0 OFFSET(28) NUMBITS(3) [],
        EN OFFSET(31) NUMBITS(1) [],
    ],
    SWD_CONF [
        AUTO_FEED OFFSET(31) NUMBITS(1) [],
    ],
    FIB_SEL [
        FIB_SEL OFFSET(0) NUMBITS(3) [
            GLITCH_RST = 1,
            BOR_RST = 2,
            SUPER_WDT_RST = 3,
        ],
    ],
];

pub struct RtcCntl {
    registers: StaticRef<RtcCntlRegisters>,
}

impl RtcCntl {
    pub const fn new(base: StaticRef<RtcCntlRegisters>) -> RtcCntl {
        RtcCntl { registers: base }
    }

    /// Enable WDT config writes
    fn enable_wdt_access(&self) {
        self.registers.wdtprotect.set(0x50D8_3AA1);
    }

    /// Disable WDT config writes
    fn disable_wdt_access(&self) {
        self.registers.wdtprotect.set(0);
    }

    /// Disable the RTC watchdog, including its flash-boot protection mode.
    pub fn disable_wdt(&self) {
        self.enable_wdt_access();

        self.registers
            .wdtconfig0
            .modify(WDTCONFIG0::EN::CLEAR + WDTCONFIG0::FLASHBOOT_MOD_EN::CLEAR);
        if self
            .registers
            .wdtconfig0
            .is_set(WDTCONFIG0::FLASHBOOT_MOD_EN)
        {
            panic!("Can't disable RTC CNTL WDT");
        }

        self.disable_wdt_access();
    }

    fn enable_sw_wdt_access(&self) {
        self.registers.swd_wprotect.set(0x8F1D_312A);
    }

    fn disable_sw_wdt_access(&self) {
        self.registers.swd_wprotect.set(0);
    }

    /// Put the super watchdog on automatic feed so it never fires.
    pub fn disable_super_wdt(&self) {
        self.registers.fib_sel.modify(FIB_SEL::FIB_SEL::BOR_RST);

        self.enable_sw_wdt_access();
        self.registers.swd_conf.modify(SWD_CONF::AUTO_FEED::SET);
        self.disable_sw_wdt_access();
    }
}
