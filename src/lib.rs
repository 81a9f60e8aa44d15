//! Terminal client for a multi-agent project workspace.
//!
//! The workspace service holds a roster of agents, a set of projects and a
//! per-project message log. [`core::app::App`] mirrors that state; every
//! change goes through [`core::app::apply_action`], and the resulting
//! [`core::app::AppCommand`]s are executed by [`desk_loop::DeskLoop`].

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod desk_loop;
pub mod logging;
pub mod utils;
