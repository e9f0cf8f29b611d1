pub mod actions;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod lister;
pub mod notify;
pub mod refresh;
pub mod request;
pub mod terminal;
pub mod tmux;
pub mod util;
