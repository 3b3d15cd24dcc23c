//! topiclens: a dashboard for receipt topic-analysis results.
//!
//! The library holds everything the `topiclens` binary and the integration
//! tests share: the result model, insight derivation, the section renderers,
//! the analysis client and controller, config, run history and the web
//! dashboard.

pub mod analytics;
pub mod cli;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod insights;
pub mod model;
pub mod render;
pub mod run;
pub mod web;
