// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Proto-Gen core library
//!
//! Multi-provider LLM dispatch with fallback, and the laboratory protocol
//! service built on top of it.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain types, vendor adapters, the protocol service and its
//!   HTTP API

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
