//! Terminal front-end for the Docker daemon: lists containers, images,
//! networks and volumes, and runs their lifecycle operations through the
//! `docker` command line.

pub mod app;
pub mod config;
pub mod docker;
pub mod format;
pub mod logging;
pub mod notify;
pub mod resource;
pub mod resources;
pub mod ui;
