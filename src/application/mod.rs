//! Application layer orchestrating the per-job pipeline.
//!
//! `JobProcessor` runs one job through the threshold/resolution/dispatch
//! state machine; `QueueConsumer` feeds it jobs under a concurrency cap and
//! owns acknowledgment.

pub mod consumer;
pub mod processor;
