mod pileup;

pub use pileup::{allele_calls, AlleleCall};
