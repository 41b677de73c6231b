mod application;
mod config;
mod error;
mod helpers;
mod runner;
