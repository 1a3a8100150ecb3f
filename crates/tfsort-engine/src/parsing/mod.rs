pub mod block;
pub(crate) mod scanner;

pub use block::{Block, BlockKind};

use scanner::Cursor;
use thiserror::Error;

/// Content does not parse into well-formed top-level blocks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("line {line}: expected a block header, found `{found}`")]
    UnexpectedTopLevel { line: usize, found: String },
    #[error("line {line}: malformed block header: {reason}")]
    MalformedHeader { line: usize, reason: String },
    #[error("line {line}: block `{header}` is missing its closing brace")]
    UnbalancedBrace { line: usize, header: String },
    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },
    #[error("line {line}: unterminated block comment")]
    UnterminatedComment { line: usize },
    #[error("line {line}: heredoc `{marker}` is never terminated")]
    UnterminatedHeredoc { line: usize, marker: String },
    #[error("no configuration blocks found")]
    NoBlocks,
}

/// The extractor's result: every top-level block in source order, plus any
/// comment lines trailing the final block (emitted at the end of the output).
#[derive(Debug)]
pub struct ScannedFile {
    pub blocks: Vec<Block>,
    pub epilogue: String,
}

/// Scans source text into its top-level blocks.
///
/// Comments between blocks attach to the block that follows them, so sorting
/// never drops user text. A file with zero blocks is rejected: accepting it
/// would imply it is a legitimate configuration.
pub fn scan_blocks(src: &str) -> Result<ScannedFile, StructuralError> {
    let mut cur = Cursor::new(src);
    let mut blocks = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    loop {
        skip_trivia(&mut cur, &mut pending)?;
        if cur.is_eof() {
            break;
        }
        let block = scan_block(&mut cur, &mut pending, blocks.len())?;
        blocks.push(block);
    }

    if blocks.is_empty() {
        return Err(StructuralError::NoBlocks);
    }
    Ok(ScannedFile {
        blocks,
        epilogue: pending.join("\n"),
    })
}

/// Skips top-level whitespace, collecting comment lines for attachment to the
/// next block.
fn skip_trivia<'a>(cur: &mut Cursor<'a>, pending: &mut Vec<&'a str>) -> Result<(), StructuralError> {
    loop {
        match cur.peek() {
            Some(b' ' | b'\t' | b'\r' | b'\n') => {
                cur.bump();
            }
            Some(b'#') => {
                pending.push(cur.take_line());
            }
            Some(b'/') if cur.peek_at(1) == Some(b'/') => {
                pending.push(cur.take_line());
            }
            Some(b'/') if cur.peek_at(1) == Some(b'*') => {
                pending.push(cur.take_block_comment()?);
            }
            _ => return Ok(()),
        }
    }
}

fn scan_block<'a>(
    cur: &mut Cursor<'a>,
    pending: &mut Vec<&'a str>,
    index: usize,
) -> Result<Block, StructuralError> {
    let header_line = cur.line();
    let header_start = cur.pos();

    let keyword = match cur.read_identifier() {
        Some(keyword) => keyword,
        None => {
            return Err(StructuralError::UnexpectedTopLevel {
                line: header_line,
                found: cur.line_text_from(header_start).trim().to_string(),
            });
        }
    };

    let mut labels: Vec<String> = Vec::new();
    loop {
        cur.skip_inline_ws();
        match cur.peek() {
            Some(b'{') => {
                cur.bump();
                break;
            }
            Some(b'"') => {
                if labels.len() == 2 {
                    return Err(StructuralError::MalformedHeader {
                        line: header_line,
                        reason: format!("block `{keyword}` has more than two labels"),
                    });
                }
                cur.bump();
                labels.push(read_quoted_label(cur)?);
            }
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => {
                if labels.len() == 2 {
                    return Err(StructuralError::MalformedHeader {
                        line: header_line,
                        reason: format!("block `{keyword}` has more than two labels"),
                    });
                }
                if let Some(label) = cur.read_identifier() {
                    labels.push(label.to_string());
                }
            }
            Some(b'=') => {
                // a bare top-level assignment is not a block
                return Err(StructuralError::UnexpectedTopLevel {
                    line: header_line,
                    found: cur.line_text_from(header_start).trim().to_string(),
                });
            }
            _ => {
                return Err(StructuralError::MalformedHeader {
                    line: cur.line(),
                    reason: format!("expected `{{` after `{keyword}` header"),
                });
            }
        }
    }

    let body_start = cur.pos();
    let body_end;
    let mut depth = 1usize;
    loop {
        match cur.peek() {
            None => {
                return Err(StructuralError::UnbalancedBrace {
                    line: header_line,
                    header: header_display(keyword, &labels),
                });
            }
            Some(b'{') => {
                cur.bump();
                depth += 1;
            }
            Some(b'}') => {
                let at = cur.pos();
                cur.bump();
                depth -= 1;
                if depth == 0 {
                    body_end = at;
                    break;
                }
            }
            Some(b'"') => {
                cur.bump();
                cur.skip_string()?;
            }
            Some(b'#') => {
                cur.take_line();
            }
            Some(b'/') if cur.peek_at(1) == Some(b'/') => {
                cur.take_line();
            }
            Some(b'/') if cur.peek_at(1) == Some(b'*') => {
                cur.take_block_comment()?;
            }
            Some(b'<') if cur.peek_at(1) == Some(b'<') => {
                cur.skip_heredoc()?;
            }
            Some(_) => {
                cur.bump();
            }
        }
    }

    // Inline comments on the closing-brace line belong to this block.
    let mut end = cur.pos();
    let mut checkpoint = cur.pos();
    loop {
        cur.skip_inline_ws();
        match cur.peek() {
            Some(b'#') => {}
            Some(b'/') if cur.peek_at(1) == Some(b'/') => {}
            Some(b'/') if cur.peek_at(1) == Some(b'*') => {
                cur.take_block_comment()?;
                end = cur.pos();
                checkpoint = cur.pos();
                continue;
            }
            _ => {
                cur.set_pos(checkpoint);
                break;
            }
        }
        while let Some(b) = cur.peek() {
            if b == b'\n' {
                break;
            }
            cur.bump();
        }
        end = cur.pos();
        checkpoint = cur.pos();
    }

    let mut raw_text = String::new();
    for comment in pending.drain(..) {
        raw_text.push_str(comment.trim_end());
        raw_text.push('\n');
    }
    raw_text.push_str(cur.slice(header_start, end).trim_end());

    Ok(Block {
        kind: BlockKind::from_keyword(keyword),
        labels,
        raw_text,
        body: cur.slice(body_start, body_end).to_string(),
        original_index: index,
    })
}

/// A label in the header: the opening quote is already consumed.
fn read_quoted_label(cur: &mut Cursor<'_>) -> Result<String, StructuralError> {
    let line = cur.line();
    let start = cur.pos();
    while let Some(b) = cur.peek() {
        match b {
            b'"' => {
                let label = cur.slice(start, cur.pos()).to_string();
                cur.bump();
                return Ok(label);
            }
            b'\n' => break,
            b'\\' => {
                cur.bump();
                cur.bump();
            }
            _ => {
                cur.bump();
            }
        }
    }
    Err(StructuralError::UnterminatedString { line })
}

fn header_display(keyword: &str, labels: &[String]) -> String {
    let mut header = keyword.to_string();
    for label in labels {
        header.push_str(" \"");
        header.push_str(label);
        header.push('"');
    }
    header
}
