//! AstraPath shared core: route planning with safety annotations, the SOS and
//! Safe Companion emergency flows, and the fake incoming call.
//!
//! The shell drives the core with [`Event`]s, carries out the requested
//! [`Effect`]s and renders the [`ViewModel`].

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod emergency;
pub mod error;
pub mod event;
pub mod fake_call;
pub mod geo;
pub mod locale;
pub mod map;
pub mod model;
pub mod presentation;
pub mod reports;
pub mod route;
pub mod view;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::AppConfig;
pub use crux_core::{render::Render, App as CruxApp};
pub use error::{AppError, ErrorKind, Notice};
pub use event::Event;
pub use model::Model;
pub use view::ViewModel;
