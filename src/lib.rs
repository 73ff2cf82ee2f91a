// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod arn;
pub mod aws;
pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod helm;
pub mod kubectl;
pub mod kubernetes;
pub mod pipeline;
pub mod policy;

#[cfg(test)]
pub mod test_utils;
