// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapters binding external geometry crates to the [`Adaptor`] contract.
//!
//! [`Adaptor`]: orthant_grid::Adaptor

#[cfg(feature = "kurbo")]
pub mod kurbo;
