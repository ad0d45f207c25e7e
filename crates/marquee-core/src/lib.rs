//! # Marquee Core
//!
//! The domain layer of the Marquee blog platform.
//! This crate contains the content model, the ports the infrastructure
//! implements, and the services that hold the business rules.

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use error::DomainError;
