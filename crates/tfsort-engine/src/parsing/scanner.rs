use super::StructuralError;

/// Byte-level cursor over source text with line tracking.
///
/// All structural syntax in this dialect is ASCII, so the cursor matches on
/// bytes; `bump` still advances by whole characters so positions stay on
/// UTF-8 boundaries and slices are always valid.
pub(crate) struct Cursor<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    /// Advances past one character, counting newlines.
    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        let width = match b {
            0x00..=0x7f => 1,
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            _ => 4,
        };
        self.pos += width;
        if b == b'\n' {
            self.line += 1;
        }
        Some(b)
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.src[start..end]
    }

    fn starts_with(&self, pat: &str) -> bool {
        self.bytes[self.pos..].starts_with(pat.as_bytes())
    }

    /// Skips spaces and tabs, never newlines.
    pub fn skip_inline_ws(&mut self) {
        while let Some(b' ' | b'\t' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    /// The text from `start` to the end of the line the cursor is on.
    pub fn line_text_from(&self, start: usize) -> &'a str {
        let end = self.src[start..]
            .find('\n')
            .map(|i| start + i)
            .unwrap_or(self.src.len());
        &self.src[start..end]
    }

    /// An identifier token: `[A-Za-z_][A-Za-z0-9_-]*`.
    pub fn read_identifier(&mut self) -> Option<&'a str> {
        match self.peek() {
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
            _ => return None,
        }
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
                self.pos += 1;
            } else {
                break;
            }
        }
        Some(&self.src[start..self.pos])
    }

    /// Consumes the rest of the current line including its newline and
    /// returns the text without the newline.
    pub fn take_line(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'\n' {
                break;
            }
            self.bump();
        }
        let text = &self.src[start..self.pos];
        self.bump();
        text
    }

    /// Consumes a `/* ... */` comment (cursor on the opening `/`) and returns
    /// its full text.
    pub fn take_block_comment(&mut self) -> Result<&'a str, StructuralError> {
        let start = self.pos;
        let line = self.line;
        self.pos += 2;
        while !self.is_eof() {
            if self.starts_with("*/") {
                self.pos += 2;
                return Ok(&self.src[start..self.pos]);
            }
            self.bump();
        }
        Err(StructuralError::UnterminatedComment { line })
    }

    /// Skips a quoted string, the opening quote already consumed. Handles
    /// escapes and `${`/`%{` template sequences, whose braces must not leak
    /// into the structural brace count.
    pub fn skip_string(&mut self) -> Result<(), StructuralError> {
        let line = self.line;
        while let Some(b) = self.peek() {
            match b {
                b'"' => {
                    self.pos += 1;
                    return Ok(());
                }
                b'\\' => {
                    self.pos += 1;
                    self.bump();
                }
                b'$' | b'%' => {
                    if self.peek_at(1) == Some(b) && self.peek_at(2) == Some(b'{') {
                        // $${ and %%{ are literal escapes
                        self.pos += 3;
                    } else if self.peek_at(1) == Some(b'{') {
                        self.pos += 2;
                        self.skip_template(line)?;
                    } else {
                        self.pos += 1;
                    }
                }
                b'\n' => return Err(StructuralError::UnterminatedString { line }),
                _ => {
                    self.bump();
                }
            }
        }
        Err(StructuralError::UnterminatedString { line })
    }

    /// Skips a `${ ... }` template expression, the opener already consumed.
    /// Templates may nest strings which may nest templates again.
    fn skip_template(&mut self, line: usize) -> Result<(), StructuralError> {
        let mut depth = 1usize;
        while let Some(b) = self.peek() {
            match b {
                b'{' => {
                    self.pos += 1;
                    depth += 1;
                }
                b'}' => {
                    self.pos += 1;
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                b'"' => {
                    self.pos += 1;
                    self.skip_string()?;
                }
                _ => {
                    self.bump();
                }
            }
        }
        Err(StructuralError::UnterminatedString { line })
    }

    /// Skips a heredoc (`<<MARKER` or `<<-MARKER`), the cursor on the first
    /// `<`. Content runs until a line whose trimmed text equals the marker.
    pub fn skip_heredoc(&mut self) -> Result<(), StructuralError> {
        let line = self.line;
        self.pos += 2;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        let marker = match self.read_identifier() {
            Some(marker) => marker,
            // Not actually a heredoc opener; nothing structural was skipped.
            None => return Ok(()),
        };
        self.take_line();
        loop {
            if self.is_eof() {
                return Err(StructuralError::UnterminatedHeredoc {
                    line,
                    marker: marker.to_string(),
                });
            }
            let text = self.take_line();
            if text.trim() == marker {
                return Ok(());
            }
        }
    }
}

/// Removes line and block comments from a block body, leaving string
/// literals, templates and heredoc content intact so references inside them
/// can still be scanned.
pub fn strip_comments(body: &str) -> String {
    let mut cur = Cursor::new(body);
    let mut out = String::with_capacity(body.len());
    while let Some(b) = cur.peek() {
        match b {
            b'#' => {
                cur.take_line();
                out.push('\n');
            }
            b'/' if cur.peek_at(1) == Some(b'/') => {
                cur.take_line();
                out.push('\n');
            }
            b'/' if cur.peek_at(1) == Some(b'*') => {
                if cur.take_block_comment().is_err() {
                    break;
                }
                out.push(' ');
            }
            b'"' => {
                let start = cur.pos();
                cur.bump();
                if cur.skip_string().is_err() {
                    out.push_str(cur.line_text_from(start));
                    break;
                }
                out.push_str(cur.slice(start, cur.pos()));
            }
            b'<' if cur.peek_at(1) == Some(b'<') => {
                let start = cur.pos();
                if cur.skip_heredoc().is_err() {
                    break;
                }
                out.push_str(cur.slice(start, cur.pos()));
            }
            _ => {
                let start = cur.pos();
                cur.bump();
                out.push_str(cur.slice(start, cur.pos()));
            }
        }
    }
    out
}

/// Collects the names of depth-zero `name = ...` attributes in a block body.
/// This is how `local.<name>` mentions find the `locals` block declaring them.
pub fn top_level_attr_names(body: &str) -> Vec<String> {
    let mut cur = Cursor::new(body);
    let mut names = Vec::new();
    let mut depth = 0usize;
    loop {
        match cur.peek() {
            None => break,
            Some(b'{') => {
                cur.bump();
                depth += 1;
            }
            Some(b'}') => {
                cur.bump();
                depth = depth.saturating_sub(1);
            }
            Some(b'"') => {
                cur.bump();
                if cur.skip_string().is_err() {
                    break;
                }
            }
            Some(b'#') => {
                cur.take_line();
            }
            Some(b'/') if cur.peek_at(1) == Some(b'/') => {
                cur.take_line();
            }
            Some(b'/') if cur.peek_at(1) == Some(b'*') => {
                if cur.take_block_comment().is_err() {
                    break;
                }
            }
            Some(b'<') if cur.peek_at(1) == Some(b'<') => {
                if cur.skip_heredoc().is_err() {
                    break;
                }
            }
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => {
                if let Some(ident) = cur.read_identifier()
                    && depth == 0
                {
                    cur.skip_inline_ws();
                    // `=` but not `==`
                    if cur.peek() == Some(b'=') && cur.peek_at(1) != Some(b'=') {
                        names.push(ident.to_string());
                    }
                }
            }
            Some(_) => {
                cur.bump();
            }
        }
    }
    names
}
