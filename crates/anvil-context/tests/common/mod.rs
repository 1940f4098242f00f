//! Common test utilities for anvil-context
//!
//! This module provides shared test infrastructure including:
//! - Recording post-processors and decorators that log their invocations
//! - Definition builders for each priority tier
//! - Factory and delegate fixtures wired to a recording observer

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod mocks;

pub use builders::*;
pub use mocks::*;
