mod alignment;
mod batch;
mod best_hits;
mod mask;
mod sampling;
mod score;

pub use alignment::{AlignmentRecord, PairingFlags, ReadPairUnit, ReadPairs};
pub use batch::{discard_batch, find_best_hits, write_best_hits, BatchAssignment, MapParams};
pub use best_hits::{AssignedRead, BestHitResolver, Hit, Offer, TieSummary};
pub use mask::{run_accession, TaxMask};
pub use sampling::weighted_choice;
pub use score::{score_unit, AlignmentScore};
