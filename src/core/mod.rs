// src/core/mod.rs

pub mod action;
pub mod cache;
pub mod context;
pub mod defaults;
pub mod invoked;
pub mod paths;
pub mod registry;
pub mod style;
pub mod style_config;
pub mod uid;
