//! Dashboard Service - invoice create, edit and delete form actions.

pub mod actions;
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
