// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O for backdrop frames and annotation files.

pub mod media;
pub mod serialization;
