use std::io::{BufReader, Read};
use std::sync::{Arc, Mutex};

use crate::ast::Param;
use crate::error::AniseError;

/// A lazy character list over an `io::Read`. Characters are pulled on
/// demand into a shared cache, so every clone (and every `tail`) observes
/// the same deterministic sequence regardless of consumption order.
///
/// This is the value behind `__stdin` and behind handles returned by
/// `open`; closing drops the underlying reader while keeping the cached
/// prefix readable.
#[derive(Clone)]
pub struct CharInput {
    state: Arc<Mutex<InputState>>,
    pos: usize,
}

struct InputState {
    reader: Option<Box<dyn Read + Send>>,
    chars: Vec<char>,
    eof: bool,
    closed: bool,
}

impl CharInput {
    pub fn new<R>(reader: R) -> CharInput
    where
        R: Read + Send + 'static,
    {
        CharInput {
            state: Arc::new(Mutex::new(InputState {
                reader: Some(Box::new(BufReader::new(reader))),
                chars: Vec::new(),
                eof: false,
                closed: false,
            })),
            pos: 0,
        }
    }

    /// Drop the underlying reader. Reading past the cached prefix after
    /// closing is an I/O error; a second close is a no-op.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        if state.reader.take().is_some() {
            state.closed = true;
        }
    }

    fn char_at(&self, index: usize) -> Result<Option<char>, AniseError> {
        let mut state = self.state.lock().unwrap();
        while state.chars.len() <= index && !state.eof {
            if state.closed {
                return Err(AniseError::io("input handle is closed"));
            }
            let reader = match state.reader.as_mut() {
                Some(reader) => reader,
                None => {
                    state.eof = true;
                    break;
                }
            };
            match read_char(reader)? {
                Some(ch) => state.chars.push(ch),
                None => state.eof = true,
            }
        }
        Ok(state.chars.get(index).copied())
    }

    pub fn head(&self) -> Result<Param, AniseError> {
        match self.char_at(self.pos)? {
            Some(ch) => Ok(Param::str_(ch.to_string())),
            None => Err(AniseError::structural(
                "cannot perform head on empty input",
            )),
        }
    }

    pub fn head_opt(&self) -> Result<Option<Param>, AniseError> {
        Ok(self
            .char_at(self.pos)?
            .map(|ch| Param::str_(ch.to_string())))
    }

    pub fn tail(&self) -> Result<CharInput, AniseError> {
        if self.char_at(self.pos)?.is_none() {
            return Err(AniseError::structural(
                "cannot perform tail on empty input",
            ));
        }
        Ok(self.tail_unchecked())
    }

    /// Advance without the emptiness check; callers use it right after a
    /// successful `head`.
    pub fn tail_unchecked(&self) -> CharInput {
        CharInput {
            state: self.state.clone(),
            pos: self.pos + 1,
        }
    }

    pub fn is_empty(&self) -> Result<bool, AniseError> {
        Ok(self.char_at(self.pos)?.is_none())
    }
}

/// Incremental UTF-8 decode of a single character. Invalid bytes decode to
/// the replacement character rather than aborting the stream.
fn read_char(reader: &mut dyn Read) -> Result<Option<char>, AniseError> {
    let mut first = [0u8; 1];
    loop {
        match reader.read(&mut first) {
            Ok(0) => return Ok(None),
            Ok(_) => break,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    let width = match first[0] {
        b if b < 0x80 => 1,
        b if b & 0xE0 == 0xC0 => 2,
        b if b & 0xF0 == 0xE0 => 3,
        b if b & 0xF8 == 0xF0 => 4,
        _ => return Ok(Some(char::REPLACEMENT_CHARACTER)),
    };
    let mut buf = [0u8; 4];
    buf[0] = first[0];
    if width > 1 {
        let mut filled = 1usize;
        while filled < width {
            match reader.read(&mut buf[filled..width]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        if filled < width {
            return Ok(Some(char::REPLACEMENT_CHARACTER));
        }
    }
    match std::str::from_utf8(&buf[..width]) {
        Ok(s) => Ok(s.chars().next()),
        Err(_) => Ok(Some(char::REPLACEMENT_CHARACTER)),
    }
}
