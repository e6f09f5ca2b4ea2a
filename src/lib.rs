//! Word-twist puzzle engine: a dictionary, a precomputed solution cache for
//! curated racks, a level-tiered puzzle generator and a round-session store
//! that referees submissions. `handlers` exposes all of it over HTTP.

pub mod config;
pub mod error;
pub mod game;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;
