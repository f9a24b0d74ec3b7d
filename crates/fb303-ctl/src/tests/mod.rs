//! Test suites for the control utility runtime.

pub(crate) mod support;
