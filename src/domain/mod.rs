//! Core domain types: the queue payload, payment values, and the two
//! text parsers that pull a payment instruction out of a post.

pub mod job;
pub mod parse;
pub mod payment;
pub mod ports;
