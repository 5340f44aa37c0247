// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Test-only fakes for exercising the dispatch layer
//!
//! Provides an in-memory stand-in for the native collaborator so that unit
//! tests can assert which native primitives were (or were not) invoked.

#[cfg(test)]
pub mod fake_native;
