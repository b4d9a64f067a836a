//! Bearer token session and profile page for an identity server.
//!
//! * [`auth`] keeps the session token and issues authenticated requests
//! * [`ui`] fetches the current user's profile and renders it into a [`render::Page`]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
extern crate log;

pub mod auth;
pub mod config;
pub mod error;
pub mod handoff;
pub mod http;
pub mod navigation;
pub mod profile;
pub mod render;
pub mod storage;
pub mod token;
pub mod ui;
