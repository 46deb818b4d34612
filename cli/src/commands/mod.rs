// Copyright (c) 2026 Runway Contributors
// SPDX-License-Identifier: MIT

//! Command implementations for the Runway CLI

pub mod check;
pub mod exec;

pub use self::check::CheckCommand;
pub use self::exec::ExecCommand;
