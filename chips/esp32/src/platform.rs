// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! The platform services the boot sequencer consumes.

use crate::rtc_cntl::RtcCntl;
use crate::timg::TimG;
use boot_common::hil::BootPlatform;

pub struct Esp32Platform<'a> {
    rtc_cntl: &'a RtcCntl,
    timg0: &'a TimG,
    timg1: &'a TimG,
}

impl<'a> Esp32Platform<'a> {
    pub fn new(rtc_cntl: &'a RtcCntl, timg0: &'a TimG, timg1: &'a TimG) -> Self {
        Esp32Platform {
            rtc_cntl,
            timg0,
            timg1,
        }
    }
}

impl BootPlatform for Esp32Platform<'_> {
    fn quiesce_watchdogs(&self) {
        self.rtc_cntl.disable_super_wdt();
        self.rtc_cntl.disable_wdt();
        self.timg0.disable_wdt();
        self.timg1.disable_wdt();
    }
}
