// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Hardware-generic core of a second-stage flash boot loader.
//!
//! This crate parses a bootable image out of SPI flash, copies RAM-resident
//! segments into place through a single reusable translation-table window,
//! and maps the cached read-only-data and executable segments
//! execute-in-place. All hardware access goes through the traits in [`hil`];
//! a chip crate provides the register-level implementations and a host test
//! can provide mocks.

#![cfg_attr(not(test), no_std)]

pub mod error;
pub mod hil;
pub mod image;
pub mod mapper;
pub mod segment;
pub mod sequencer;
pub mod static_ref;
pub mod window;

#[cfg(test)]
mod tests;

pub use crate::error::BootError;
pub use crate::static_ref::StaticRef;
