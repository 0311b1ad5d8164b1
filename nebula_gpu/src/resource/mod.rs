/// Resource module - residency, synchronization and descriptor bookkeeping

// Module declarations
pub mod upload_ring;
pub mod descriptor_table;
pub mod context;
pub mod material;

// Re-export from modules
pub use upload_ring::*;
pub use descriptor_table::*;
pub use context::*;
pub use material::*;
