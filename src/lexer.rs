use crate::error::ParseError;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Ident(String),
    /// string literal, escapes already decoded
    Str(Vec<u8>),
    Int(i64),
    Uint(u64),
    Float(f64),
    LBrace,
    RBrace,
    LAngle,
    RAngle,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Semi,
    Dot,
    Slash,
}

/// 1-based source position
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

/// Tokenizer for protobuf text format.
pub struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn position(&self) -> Pos {
        Pos {
            line: self.line,
            col: self.col,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.bump();
                }
                Some(b'#') => {
                    while !matches!(self.peek(), None | Some(b'\n')) {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    /// next token with its position, or `None` at end of input
    pub fn next_token(&mut self) -> Result<Option<(Pos, Token)>, ParseError> {
        self.skip_trivia();
        let pos = self.position();
        let Some(b) = self.peek() else {
            return Ok(None);
        };
        let tok = match b {
            b'{' => self.punct(Token::LBrace),
            b'}' => self.punct(Token::RBrace),
            b'<' => self.punct(Token::LAngle),
            b'>' => self.punct(Token::RAngle),
            b'[' => self.punct(Token::LBracket),
            b']' => self.punct(Token::RBracket),
            b':' => self.punct(Token::Colon),
            b',' => self.punct(Token::Comma),
            b';' => self.punct(Token::Semi),
            b'/' => self.punct(Token::Slash),
            b'.' if !matches!(self.peek_at(1), Some(b'0'..=b'9')) => self.punct(Token::Dot),
            q @ (b'"' | b'\'') => {
                self.bump();
                Token::Str(self.string(q, pos)?)
            }
            b'-' => {
                self.bump();
                self.negative(pos)?
            }
            b'0'..=b'9' | b'.' => self.number(pos, false)?,
            b if b == b'_' || b.is_ascii_alphabetic() => Token::Ident(self.ident()),
            other => {
                return Err(ParseError::new(
                    pos.line,
                    pos.col,
                    format!("unexpected character {:?}", char::from(other)),
                ))
            }
        };
        Ok(Some((pos, tok)))
    }

    fn punct(&mut self, tok: Token) -> Token {
        self.bump();
        tok
    }

    fn ident(&mut self) -> String {
        let mut s = String::new();
        while let Some(b) = self.peek() {
            if b == b'_' || b.is_ascii_alphanumeric() {
                s.push(char::from(b));
                self.bump();
            } else {
                break;
            }
        }
        s
    }

    fn negative(&mut self, pos: Pos) -> Result<Token, ParseError> {
        match self.peek() {
            Some(b'0'..=b'9' | b'.') => self.number(pos, true),
            Some(b'i') => {
                let id = self.ident();
                if id == "inf" || id == "infinity" {
                    Ok(Token::Float(f64::NEG_INFINITY))
                } else {
                    Err(ParseError::new(
                        pos.line,
                        pos.col,
                        format!("unexpected '-{id}'"),
                    ))
                }
            }
            _ => Err(ParseError::new(pos.line, pos.col, "expected digits after '-'")),
        }
    }

    fn number(&mut self, pos: Pos, negative: bool) -> Result<Token, ParseError> {
        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x' | b'X')) {
            self.bump();
            self.bump();
            let mut digits = String::new();
            while let Some(b) = self.peek() {
                if b.is_ascii_hexdigit() {
                    digits.push(char::from(b));
                    self.bump();
                } else {
                    break;
                }
            }
            if digits.is_empty() {
                return Err(ParseError::new(pos.line, pos.col, "expected hex digits after '0x'"));
            }
            let value = u64::from_str_radix(&digits, 16).map_err(|_| {
                ParseError::new(pos.line, pos.col, "hex literal out of range")
            })?;
            return int_token(value, negative, pos);
        }

        let mut text = String::new();
        let mut is_float = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => {
                    text.push(char::from(b));
                    self.bump();
                }
                b'.' => {
                    is_float = true;
                    text.push('.');
                    self.bump();
                }
                b'e' | b'E' => {
                    is_float = true;
                    text.push(char::from(b));
                    self.bump();
                    if let Some(sign @ (b'+' | b'-')) = self.peek() {
                        text.push(char::from(sign));
                        self.bump();
                    }
                }
                _ => break,
            }
        }
        // 'f' suffix forces a float, unless it starts an identifier
        if matches!(self.peek(), Some(b'f' | b'F'))
            && !matches!(self.peek_at(1), Some(c) if c == b'_' || c.is_ascii_alphanumeric())
        {
            self.bump();
            is_float = true;
        }

        if is_float {
            let value: f64 = text.parse().map_err(|_| {
                ParseError::new(pos.line, pos.col, format!("malformed number '{text}'"))
            })?;
            Ok(Token::Float(if negative { -value } else { value }))
        } else if text.len() > 1 && text.starts_with('0') {
            let value = u64::from_str_radix(&text, 8).map_err(|_| {
                ParseError::new(pos.line, pos.col, format!("malformed octal literal '{text}'"))
            })?;
            int_token(value, negative, pos)
        } else {
            let value: u64 = text.parse().map_err(|_| {
                ParseError::new(pos.line, pos.col, "integer literal out of range")
            })?;
            int_token(value, negative, pos)
        }
    }

    fn string(&mut self, quote: u8, pos: Pos) -> Result<Vec<u8>, ParseError> {
        let mut out = Vec::new();
        loop {
            let (line, col) = (self.line, self.col);
            match self.bump() {
                None | Some(b'\n') => {
                    return Err(ParseError::new(pos.line, pos.col, "unterminated string literal"))
                }
                Some(b) if b == quote => return Ok(out),
                Some(b'\\') => self.escape(&mut out, line, col)?,
                Some(b) => out.push(b),
            }
        }
    }

    fn escape(&mut self, out: &mut Vec<u8>, line: u32, col: u32) -> Result<(), ParseError> {
        let Some(b) = self.bump() else {
            return Err(ParseError::new(line, col, "unterminated escape sequence"));
        };
        match b {
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'\\' | b'\'' | b'"' | b'?' => out.push(b),
            b'0'..=b'7' => {
                let mut v = u32::from(b - b'0');
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'7') => {
                            v = v * 8 + u32::from(d - b'0');
                            self.bump();
                        }
                        _ => break,
                    }
                }
                if v > 0xff {
                    return Err(ParseError::new(line, col, "octal escape out of range"));
                }
                out.push(v as u8);
            }
            b'x' | b'X' => {
                let mut v: u32 = 0;
                let mut n = 0;
                while n < 2 {
                    match self.peek() {
                        Some(d) if d.is_ascii_hexdigit() => {
                            v = v * 16 + u32::from(hex_val(d));
                            self.bump();
                            n += 1;
                        }
                        _ => break,
                    }
                }
                if n == 0 {
                    return Err(ParseError::new(line, col, "expected hex digits after '\\x'"));
                }
                out.push(v as u8);
            }
            b'u' => self.unicode_escape(out, 4, line, col)?,
            b'U' => self.unicode_escape(out, 8, line, col)?,
            other => {
                return Err(ParseError::new(
                    line,
                    col,
                    format!("invalid escape sequence '\\{}'", char::from(other)),
                ))
            }
        }
        Ok(())
    }

    fn unicode_escape(
        &mut self,
        out: &mut Vec<u8>,
        len: u32,
        line: u32,
        col: u32,
    ) -> Result<(), ParseError> {
        let mut v = self.hex_digits(len, line, col)?;
        // \u high surrogate must be followed by its low half
        if len == 4 && (0xd800..0xdc00).contains(&v) {
            if self.peek() != Some(b'\\') || self.peek_at(1) != Some(b'u') {
                return Err(ParseError::new(line, col, "unpaired surrogate in unicode escape"));
            }
            self.bump();
            self.bump();
            let lo = self.hex_digits(4, line, col)?;
            if !(0xdc00..0xe000).contains(&lo) {
                return Err(ParseError::new(line, col, "unpaired surrogate in unicode escape"));
            }
            v = 0x10000 + ((v - 0xd800) << 10) + (lo - 0xdc00);
        }
        let Some(c) = char::from_u32(v) else {
            return Err(ParseError::new(
                line,
                col,
                format!("invalid unicode code point U+{v:04X}"),
            ));
        };
        let mut buf = [0u8; 4];
        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        Ok(())
    }

    fn hex_digits(&mut self, len: u32, line: u32, col: u32) -> Result<u32, ParseError> {
        let mut v: u32 = 0;
        for _ in 0..len {
            match self.bump() {
                Some(d) if d.is_ascii_hexdigit() => v = v * 16 + u32::from(hex_val(d)),
                _ => return Err(ParseError::new(line, col, "truncated unicode escape")),
            }
        }
        Ok(v)
    }
}

fn int_token(value: u64, negative: bool, pos: Pos) -> Result<Token, ParseError> {
    if negative {
        if value <= i64::MAX as u64 {
            Ok(Token::Int(-(value as i64)))
        } else if value == i64::MAX as u64 + 1 {
            Ok(Token::Int(i64::MIN))
        } else {
            Err(ParseError::new(pos.line, pos.col, "integer literal out of range"))
        }
    } else if value <= i64::MAX as u64 {
        Ok(Token::Int(value as i64))
    } else {
        Ok(Token::Uint(value))
    }
}

fn hex_val(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}
