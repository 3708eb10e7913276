pub mod cli;
pub mod clusters;
pub mod commands;
pub mod coverage;
pub mod reassign;
pub mod snps;
pub mod utils;
pub mod writers;
