// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Raw writes into segment load targets.

use boot_common::hil::Ram;

/// Writes straight to physical RAM addresses taken from segment
/// descriptors. These ranges are trusted, unvalidated hardware-facing
/// memory; nothing here checks that a descriptor points at writable RAM.
pub struct RawRam;

impl Ram for RawRam {
    fn copy_to(&self, addr: u32, bytes: &[u8]) {
        unsafe {
            core::ptr::copy_nonoverlapping(bytes.as_ptr(), addr as *mut u8, bytes.len());
        }
    }

    fn zero(&self, addr: u32, len: usize) {
        unsafe {
            core::ptr::write_bytes(addr as *mut u8, 0, len);
        }
    }
}
