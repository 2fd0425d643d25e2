pub mod farms;
pub mod search;
pub mod utils;

pub use farms::{FarmStore, UpsertOutcome};
pub use search::{FarmMatch, find_farm};

pub const DEFAULT_FARMS_FILE: &str = "data/fincas.json";
