// Copyright (c) 2026 Runway Contributors
// SPDX-License-Identifier: MIT
//! Runway core
//!
//! Domain model and execution primitives for running a project the way its
//! manifest declares: dependency containers, derived environment, commands.
//!
//! # Architecture
//!
//! - **domain:** manifest types, runtime/command boundaries, error taxonomy
//! - **application:** provisioner, environment expander, orchestrator
//! - **infrastructure:** Docker adapter, template resolver, process runner,
//!   manifest parser

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
