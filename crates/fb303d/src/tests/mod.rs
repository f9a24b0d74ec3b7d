//! Behavioural suites for the management server runtime.

mod behaviour;
mod support;
