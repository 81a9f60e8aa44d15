pub mod agents;
pub mod app;
pub mod builtin_agents;
pub mod chat;
pub mod config;
pub mod loadable;
pub mod projects;
pub mod session;
pub mod validation;
pub mod view;
