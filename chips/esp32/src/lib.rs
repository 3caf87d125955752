// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! ESP32 hardware backend for the second-stage boot loader.
//!
//! A board entry point wires these peripherals into the generic sequencer
//! and matches its result exactly once:
//!
//! ```ignore
//! let rtc_cntl = RtcCntl::new(rtc_cntl::RTC_CNTL_BASE);
//! let timg0 = TimG::new(timg::TIMG0_BASE);
//! let timg1 = TimG::new(timg::TIMG1_BASE);
//! let platform = Esp32Platform::new(&rtc_cntl, &timg0, &timg1);
//! let cache = Cache::new(cache::EXTMEM_BASE);
//! let mmu = FlashMmuTable::new(mmu::FLASH_MMU_TABLE);
//!
//! let boot = BootSequencer::new(
//!     &cache, &mmu, &RawRam, &platform, &NullOut, IMAGE_OFFSET, Some(BSS),
//! );
//! match boot.run() {
//!     Ok(image) => unsafe { image.dispatch() },
//!     Err(_) => halt(),
//! }
//! ```

#![no_std]

pub mod cache;
pub mod mmu;
pub mod platform;
pub mod ram;
pub mod rtc_cntl;
pub mod timg;
