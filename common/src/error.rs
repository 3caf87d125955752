// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Error types for the boot loader.
//!
//! The taxonomy is deliberately small: nothing this early in boot can be
//! retried, so every error is fatal and the top-level caller halts after at
//! most one diagnostic line.

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BootError {
    /// The image header's magic byte does not match [`crate::image::IMAGE_MAGIC`].
    InvalidMagic,

    /// The header declares more segments than the format allows.
    TooManySegments,

    /// A deferred region does not fit in the translation table.
    TableExhausted,
}
