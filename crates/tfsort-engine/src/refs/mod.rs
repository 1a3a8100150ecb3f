use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::parsing::{Block, BlockKind, scanner};

fn dotted_path_regex() -> &'static Regex {
    static DOTTED_PATH: OnceLock<Regex> = OnceLock::new();
    DOTTED_PATH.get_or_init(|| {
        Regex::new(r"[A-Za-z_][A-Za-z0-9_-]*(?:\.[A-Za-z_][A-Za-z0-9_-]*)+")
            .expect("invalid reference pattern")
    })
}

/// For each block, the indices of the blocks it depends on, sorted and
/// deduplicated.
///
/// Resolution is lexical: dotted paths in a block's body (comments stripped,
/// string content kept, since interpolated references are the common case)
/// become edges only when a block with the matching address exists in the
/// same file. Mentions of external symbols are ignored, and self-references
/// are discarded.
pub fn resolve(blocks: &[Block]) -> Vec<Vec<usize>> {
    let addresses = address_index(blocks);
    blocks
        .iter()
        .map(|block| {
            let body = scanner::strip_comments(&block.body);
            let mut deps: Vec<usize> = candidate_paths(&body)
                .filter_map(|path| target_of(path, &addresses))
                .filter(|&target| target != block.original_index)
                .collect();
            deps.sort_unstable();
            deps.dedup();
            deps
        })
        .collect()
}

/// Maps every reference address declared in the file to the block that owns
/// it. `locals` blocks contribute one `local.<name>` address per attribute
/// they declare; when several declare the same name, the earliest wins.
fn address_index(blocks: &[Block]) -> HashMap<String, usize> {
    let mut addresses = HashMap::new();
    for block in blocks {
        if let Some(address) = block.address() {
            addresses.entry(address).or_insert(block.original_index);
        }
        if block.kind == BlockKind::Locals {
            for name in scanner::top_level_attr_names(&block.body) {
                addresses
                    .entry(format!("local.{name}"))
                    .or_insert(block.original_index);
            }
        }
    }
    addresses
}

/// Dotted identifier paths in identifier-like positions. The boundary check
/// rejects matches that start mid-token (e.g. the tail of `ami-0abc.main`).
fn candidate_paths(body: &str) -> impl Iterator<Item = &str> {
    dotted_path_regex().find_iter(body).filter_map(|m| {
        let boundary = match body[..m.start()].bytes().last() {
            Some(b) => !(b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.'),
            None => true,
        };
        boundary.then(|| m.as_str())
    })
}

fn target_of(path: &str, addresses: &HashMap<String, usize>) -> Option<usize> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let second = segments.next()?;
    let key = match first {
        "var" => format!("var.{second}"),
        "local" | "locals" => format!("local.{second}"),
        "module" => format!("module.{second}"),
        "data" => {
            let third = segments.next()?;
            format!("data.{second}.{third}")
        }
        _ => format!("{first}.{second}"),
    };
    addresses.get(&key).copied()
}
