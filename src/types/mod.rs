//! Broker Types
//!
//! Core type definitions for the connection session broker.

pub mod config;
pub mod end_user;
pub mod integration;
pub mod params;
pub mod redirect;
pub mod session;

pub use config::*;
pub use end_user::*;
pub use integration::*;
pub use params::*;
pub use redirect::*;
pub use session::*;
