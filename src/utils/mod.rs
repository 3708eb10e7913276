mod bam_utils;
mod error;
mod io_utils;
mod layout;
pub mod math;
mod readers;
mod util;

pub use bam_utils::{get_nm_tag, open_bam_reader, scaffold_id};
pub use error::CnvError;
pub use io_utils::{create_writer, ensure_dir};
pub use layout::{batch_file_name, discover_batches, parse_batch_file_name, Layout};
pub use readers::open_text_reader;
pub use util::{handle_error_and_exit, Result};
