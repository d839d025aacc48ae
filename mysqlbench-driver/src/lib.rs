pub mod benchmark;
pub mod command;
pub mod config;
pub mod provider;
pub mod sysbench;
