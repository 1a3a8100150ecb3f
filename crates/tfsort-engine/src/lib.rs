pub mod graph;
pub mod ingest;
pub mod io;
pub mod parsing;
pub mod refs;
pub mod serialize;

// Re-export the facade surface used by the CLI
pub use graph::{CycleError, DependencyGraph};
pub use ingest::{IngestError, Ingestor, SortError, sort_source, validate_file_path};
pub use parsing::{Block, BlockKind, ScannedFile, StructuralError, scan_blocks};
