// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The ordered, fail-fast provisioning sequence.

pub mod provisioner;
pub mod stage;

pub use provisioner::{ProvisionReport, Provisioner, ReleaseAction};
pub use stage::{PipelineState, Stage};
