// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod protocol_service;

pub use protocol_service::{ProtocolError, ProtocolService};
