use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::graph::{CycleError, DependencyGraph};
use crate::io::{self, IoError, Sink};
use crate::parsing::{self, Block, StructuralError};
use crate::refs;
use crate::serialize;

const ALLOWED_EXTENSIONS: [&str; 2] = ["tf", "tofu"];

/// A failure of the pure content pipeline: structure, identity, or ordering.
#[derive(Debug, Error)]
pub enum SortError {
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error("duplicate block declaration: {identity}")]
    DuplicateIdentity { identity: String },
    #[error(transparent)]
    Cycle(#[from] CycleError),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file path is empty")]
    EmptyPath,
    #[error("no such file: {}", .0.display())]
    NotFound(PathBuf),
    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("unsupported file extension (expected .tf or .tofu): {}", .0.display())]
    UnsupportedExtension(PathBuf),
    #[error(transparent)]
    Sort(#[from] SortError),
    #[error(transparent)]
    Io(#[from] IoError),
}

impl From<StructuralError> for IngestError {
    fn from(err: StructuralError) -> Self {
        Self::Sort(SortError::Structural(err))
    }
}

/// Path-level validation: non-empty, exists, and is a regular file. Content
/// is not inspected.
pub fn validate_file_path(path: &Path) -> Result<(), IngestError> {
    if path.as_os_str().is_empty() {
        return Err(IngestError::EmptyPath);
    }
    if !path.exists() {
        return Err(IngestError::NotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(IngestError::NotAFile(path.to_path_buf()));
    }
    Ok(())
}

/// The pure transform: source text in, dependency-sorted text out. No I/O.
pub fn sort_source(src: &str) -> Result<String, SortError> {
    let scanned = parsing::scan_blocks(src)?;
    let identities = unique_identities(&scanned.blocks)?;
    let deps = refs::resolve(&scanned.blocks);
    let graph = DependencyGraph::build(identities, deps);
    log::debug!(
        "sorting {} blocks with {} dependency edges",
        graph.len(),
        graph.edge_count()
    );
    let order = graph.sort()?;
    Ok(serialize::render(
        order.iter().map(|&i| &scanned.blocks[i]),
        &scanned.epilogue,
    ))
}

fn unique_identities(blocks: &[Block]) -> Result<Vec<String>, SortError> {
    let mut seen = HashSet::new();
    let mut identities = Vec::with_capacity(blocks.len());
    for block in blocks {
        let identity = block.identity();
        if !seen.insert(identity.clone()) {
            return Err(SortError::DuplicateIdentity { identity });
        }
        identities.push(identity);
    }
    Ok(identities)
}

/// Facade over the pipeline; the only entry points the CLI uses.
#[derive(Debug, Default)]
pub struct Ingestor;

impl Ingestor {
    pub fn new() -> Self {
        Self
    }

    /// Whether the file is a candidate for sorting: valid path, a `.tf` or
    /// `.tofu` extension, and content that extracts into at least one
    /// well-formed block. The resolver and sorter do not run.
    pub fn can_ingest(&self, path: &Path) -> Result<(), IngestError> {
        validate_file_path(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext) => {}
            _ => return Err(IngestError::UnsupportedExtension(path.to_path_buf())),
        }
        let src = io::read_source(path)?;
        parsing::scan_blocks(&src)?;
        Ok(())
    }

    /// Runs the full pipeline on `input` and writes the result. With
    /// `to_stdout` set the output path is never created or modified; file
    /// writes replace the destination atomically.
    pub fn parse(&self, input: &Path, output: &Path, to_stdout: bool) -> Result<(), IngestError> {
        self.can_ingest(input)?;
        let src = io::read_source(input)?;
        let sorted = sort_source(&src)?;
        let sink = if to_stdout {
            Sink::Stdout
        } else {
            Sink::Path(output)
        };
        io::write_sink(&sink, &sorted)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SUBNET_BEFORE_INSTANCE: &str = "resource \"aws_instance\" \"web\" {\n  subnet_id = aws_subnet.main.id\n}\n\nresource \"aws_subnet\" \"main\" {\n  cidr_block = \"10.0.1.0/24\"\n}\n";

    #[test]
    fn dependency_precedes_dependant() {
        let sorted = sort_source(SUBNET_BEFORE_INSTANCE).unwrap();
        assert_eq!(
            sorted,
            "resource \"aws_subnet\" \"main\" {\n  cidr_block = \"10.0.1.0/24\"\n}\n\nresource \"aws_instance\" \"web\" {\n  subnet_id = aws_subnet.main.id\n}\n"
        );
    }

    #[test]
    fn unrelated_blocks_keep_input_order() {
        let src = "locals {\n  x = 1\n}\n\nvariable \"y\" {\n}\n";
        assert_eq!(sort_source(src).unwrap(), src);
    }

    #[test]
    fn sorting_is_idempotent() {
        let once = sort_source(SUBNET_BEFORE_INSTANCE).unwrap();
        let twice = sort_source(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn output_is_a_permutation_of_the_input_blocks() {
        let sorted = sort_source(SUBNET_BEFORE_INSTANCE).unwrap();
        let mut before: Vec<String> = parsing::scan_blocks(SUBNET_BEFORE_INSTANCE)
            .unwrap()
            .blocks
            .iter()
            .map(|b| b.raw_text.clone())
            .collect();
        let mut after: Vec<String> = parsing::scan_blocks(&sorted)
            .unwrap()
            .blocks
            .iter()
            .map(|b| b.raw_text.clone())
            .collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn duplicate_identity_is_rejected() {
        let src = "variable \"y\" {\n}\n\nvariable \"y\" {\n  default = 2\n}\n";
        let err = sort_source(src).unwrap_err();
        match err {
            SortError::DuplicateIdentity { identity } => assert_eq!(identity, "variable.y"),
            other => panic!("expected duplicate identity error, got: {other}"),
        }
    }

    #[test]
    fn mutual_reference_is_a_cycle_error() {
        let src = "resource \"aws_a\" \"x\" {\n  ref = aws_b.y.id\n}\n\nresource \"aws_b\" \"y\" {\n  ref = aws_a.x.id\n}\n";
        let err = sort_source(src).unwrap_err();
        assert!(matches!(err, SortError::Cycle(_)));
    }

    #[test]
    fn comments_travel_with_their_block() {
        let src = "# the instance\nresource \"aws_instance\" \"web\" {\n  subnet_id = aws_subnet.main.id\n}\n\nresource \"aws_subnet\" \"main\" {\n}\n";
        let sorted = sort_source(src).unwrap();
        assert_eq!(
            sorted,
            "resource \"aws_subnet\" \"main\" {\n}\n\n# the instance\nresource \"aws_instance\" \"web\" {\n  subnet_id = aws_subnet.main.id\n}\n"
        );
    }
}
