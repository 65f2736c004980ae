//! Core library for the yoloboot container bootstrap orchestrator.
//!
//! One linear sequence of idempotent stages runs at container start: log
//! directories, configuration materialization, git identity, the optional
//! command-logging hook, then four independent service activators. Every
//! stage outcome lands in the append-only safety log.

pub mod config;
pub mod error;
pub mod gitident;
pub mod io;
pub mod materialize;
pub mod paths;
pub mod safety;
pub mod services;
pub mod stage;

pub use config::{BootConfig, ServiceConfig};
pub use error::{BootError, Result};
pub use paths::Paths;
pub use safety::{SafetyLog, SafetyRecord};
pub use stage::{StageReport, StageStatus};
