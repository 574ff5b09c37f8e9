//! Configuration, event sampling, and the emission loop for the DAQ injector.
//!
//! This crate owns the injector's state machine:
//! `INIT -> READY -> (EMIT -> WAIT)*`. Each EMIT draws a category from a
//! slowly oscillating signal probability, renders a corrupted detector image,
//! stores it under its content digest, announces it on the data topic, and
//! appends the ground truth to the ledger. Inter-event delays follow a
//! Poisson arrival process.
//!
//! # Modules
//!
//! - [`clock`] -- Simulation epoch and elapsed-time derivation
//! - [`collaborators`] -- [`ObjectStore`] and [`MessageBus`] traits plus
//!   in-memory implementations
//! - [`config`] -- Configuration loading from YAML and the environment
//! - [`error`] -- [`InjectorError`] and its [`ErrorKind`] taxonomy
//! - [`runner`] -- The [`Injector`] emission loop
//! - [`sampler`] -- Signal probability and Poisson inter-arrival delays
//!
//! [`ObjectStore`]: collaborators::ObjectStore
//! [`MessageBus`]: collaborators::MessageBus
//! [`InjectorError`]: error::InjectorError
//! [`ErrorKind`]: error::ErrorKind
//! [`Injector`]: runner::Injector

pub mod clock;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod runner;
pub mod sampler;
