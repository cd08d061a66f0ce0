// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain types shared by every layer.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Provider identities and the LLM capability, service
//!   configuration, protocol payloads

pub mod config;
pub mod llm;
pub mod protocol;
