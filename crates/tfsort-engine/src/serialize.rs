use crate::parsing::Block;

/// Re-emits blocks verbatim in the given order, exactly one blank line
/// between blocks and a single trailing newline. Any trailing file comments
/// (the epilogue) stay at the end of the output.
pub fn render<'a, I>(blocks: I, epilogue: &str) -> String
where
    I: IntoIterator<Item = &'a Block>,
{
    let mut out = String::new();
    for block in blocks {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(block.raw_text.trim_end());
    }
    let epilogue = epilogue.trim_end();
    if !epilogue.is_empty() {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(epilogue);
    }
    out.push('\n');
    out
}
