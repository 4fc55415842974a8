use im::Vector;

use crate::ast::{Param, Sexpr, Value};
use crate::error::AniseError;
use crate::runtime::Interpret;

/// Char-based reader producing expression trees one top-level form at a
/// time. Integer parsing is delegated to the interpreter so that a
/// `(use bigmath)` directive switches precision for the rest of the stream.
pub struct Reader<'a> {
    chars: Vec<char>,
    index: usize,
    line: usize,
    col: usize,
    interp: &'a Interpret,
}

impl<'a> Reader<'a> {
    pub fn new(source: &str, interp: &'a Interpret) -> Reader<'a> {
        Reader {
            chars: source.chars().collect(),
            index: 0,
            line: 1,
            col: 1,
            interp,
        }
    }

    pub fn next_expr(&mut self) -> Result<Option<Param>, AniseError> {
        self.skip_ws_and_comments();
        if self.eof() {
            return Ok(None);
        }
        self.read_form().map(Some)
    }

    fn read_form(&mut self) -> Result<Param, AniseError> {
        match self.peek() {
            Some('(') => {
                self.advance();
                self.read_list(false)
            }
            Some('\'') => {
                self.advance();
                if self.peek() == Some('(') {
                    self.advance();
                    self.read_list(true)
                } else {
                    Err(self.err("quote must be followed by a list"))
                }
            }
            Some('"') => {
                self.advance();
                self.read_string()
            }
            Some(')') => Err(self.err("unexpected closing parenthesis")),
            Some(_) => self.read_atom(),
            None => Err(self.err("unexpected end of input")),
        }
    }

    fn read_list(&mut self, quoted: bool) -> Result<Param, AniseError> {
        let mut items: Vector<Param> = Vector::new();
        loop {
            self.skip_ws_and_comments();
            match self.peek() {
                Some(')') => {
                    self.advance();
                    return Ok(Param::new(Value::List(Sexpr {
                        items,
                        quoted,
                        lambda: false,
                    })));
                }
                Some(_) => items.push_back(self.read_form()?),
                None => return Err(self.err("unclosed list")),
            }
        }
    }

    fn read_string(&mut self) -> Result<Param, AniseError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    return Ok(Param::str_(out));
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some('"') => out.push('"'),
                        Some('\\') => out.push('\\'),
                        Some('n') => out.push('\n'),
                        Some(other) => {
                            out.push('\\');
                            out.push(other);
                        }
                        None => return Err(self.err("unterminated string literal")),
                    }
                    self.advance();
                }
                Some(ch) => {
                    out.push(ch);
                    self.advance();
                }
                None => return Err(self.err("unterminated string literal")),
            }
        }
    }

    fn read_atom(&mut self) -> Result<Param, AniseError> {
        let mut token = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || matches!(ch, '(' | ')' | ';' | '"') {
                break;
            }
            token.push(ch);
            self.advance();
        }
        match token.as_str() {
            "true" => return Ok(Param::bool_(true)),
            "false" => return Ok(Param::bool_(false)),
            _ => {}
        }
        if let Some(number) = self.interp.parse_int(&token) {
            return Ok(Param::new(Value::Int(number)));
        }
        Ok(Param::ident(token))
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some(';') => {
                    while let Some(ch) = self.peek() {
                        self.advance();
                        if ch == '\n' {
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek() {
            self.index += 1;
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }

    fn eof(&self) -> bool {
        self.index >= self.chars.len()
    }

    fn err(&self, message: &str) -> AniseError {
        AniseError::parse(format!("{}:{}: {}", self.line, self.col, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::Number;
    use crate::runtime::Interpret;
    use std::sync::Arc;

    fn read_all(src: &str) -> Result<Vec<Param>, AniseError> {
        let interp = Interpret::new(Box::new(Vec::new()));
        read_all_with(src, &interp)
    }

    fn read_all_with(src: &str, interp: &Arc<Interpret>) -> Result<Vec<Param>, AniseError> {
        let mut reader = Reader::new(src, interp);
        let mut out = Vec::new();
        while let Some(expr) = reader.next_expr()? {
            out.push(expr);
        }
        Ok(out)
    }

    #[test]
    fn reads_atoms() {
        let forms = read_all("42 -7 foo true false + <= func'").unwrap();
        assert_eq!(forms.len(), 8);
        assert!(matches!(&forms[0].value, Value::Int(Number::Small(42))));
        assert!(matches!(&forms[1].value, Value::Int(Number::Small(-7))));
        assert!(matches!(&forms[2].value, Value::Ident(id) if id == "foo"));
        assert!(matches!(&forms[3].value, Value::Bool(true)));
        assert!(matches!(&forms[4].value, Value::Bool(false)));
        assert!(matches!(&forms[5].value, Value::Ident(id) if id == "+"));
        assert!(matches!(&forms[6].value, Value::Ident(id) if id == "<="));
        assert!(matches!(&forms[7].value, Value::Ident(id) if id == "func'"));
    }

    #[test]
    fn reads_nested_and_quoted_lists() {
        let forms = read_all("(+ 1 (f 2)) '(1 2)").unwrap();
        assert_eq!(forms.len(), 2);
        match &forms[0].value {
            Value::List(s) => {
                assert!(!s.quoted);
                assert_eq!(s.len(), 3);
                assert!(matches!(&s.items[2].value, Value::List(inner) if inner.len() == 2));
            }
            other => panic!("expected list, found {:?}", other),
        }
        match &forms[1].value {
            Value::List(s) => assert!(s.quoted),
            other => panic!("expected quoted list, found {:?}", other),
        }
    }

    #[test]
    fn reads_string_escapes() {
        let forms = read_all(r#""a\"b" "line\n" "back\\slash" "odd\q""#).unwrap();
        assert!(matches!(&forms[0].value, Value::Str(s) if s == "a\"b"));
        assert!(matches!(&forms[1].value, Value::Str(s) if s == "line\n"));
        assert!(matches!(&forms[2].value, Value::Str(s) if s == "back\\slash"));
        assert!(matches!(&forms[3].value, Value::Str(s) if s == "odd\\q"));
    }

    #[test]
    fn skips_comments() {
        let forms = read_all("; header\n(f 1) ; trailing\n2").unwrap();
        assert_eq!(forms.len(), 2);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(read_all("(1 2").is_err());
        assert!(read_all(")").is_err());
        assert!(read_all("'atom").is_err());
        assert!(read_all("\"unterminated").is_err());
    }

    #[test]
    fn printed_literal_trees_reparse() {
        let forms = read_all("'(1 '(2 3) true -4)").unwrap();
        let printed = forms[0].to_string();
        assert_eq!(printed, "'(1 '(2 3) true -4)");
        let reparsed = read_all(&printed).unwrap();
        assert_eq!(format!("{:?}", forms[0]), format!("{:?}", reparsed[0]));
    }

    #[test]
    fn bigmath_mode_changes_integer_parsing() {
        let interp = Interpret::new(Box::new(Vec::new()));
        assert!(read_all_with("123456789012345678901234567890", &interp)
            .map(|forms| matches!(forms[0].value, Value::Ident(_)))
            .unwrap());
        interp.use_big_int(true);
        let forms = read_all_with("123456789012345678901234567890", &interp).unwrap();
        assert!(matches!(&forms[0].value, Value::Int(Number::Big(_))));
    }
}
