// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

pub mod clean;
pub mod demo;
pub mod inspect;
pub mod listen;
pub mod notify;
pub mod validate;
