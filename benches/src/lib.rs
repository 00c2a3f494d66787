// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for the Orthant trees; see `benches/`.
