pub mod coverage;
pub mod extract;
pub mod map;
pub mod snps;

use crate::utils::Result;
use rayon::ThreadPoolBuilder;

const CHANNEL_BUFFER_SIZE: usize = 64;

fn initialize_thread_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    log::debug!("Initializing thread pool with {} threads...", num_threads);
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("phylocnv-{}", i))
        .start_handler(|_thread_index| {
            log::trace!("Initialized thread {:?}", std::thread::current().id());
        })
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))
}
