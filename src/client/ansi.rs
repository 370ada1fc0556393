//! ANSI escape sequence stripping for clipboard values.
//!
//! Text copied from terminals often carries colour and cursor sequences.
//! `--strip-ansi` removes them before printing. Works on `char`s so that
//! multi-byte text inside or around a sequence is never split.

const ESC: char = '\x1b';
const BEL: char = '\x07';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    /// Saw ESC, classifying the sequence.
    Escape,
    /// `ESC [` parameters and intermediates, until a final byte.
    Csi,
    /// `ESC` followed by intermediates (0x20-0x2F), until a final byte.
    EscapeIntermediate,
    /// `ESC ]` payload, until BEL or ST.
    Osc,
    /// ESC inside OSC; `\` completes ST.
    OscEscape,
}

/// Remove CSI, OSC, nF and single-character escape sequences from `input`.
///
/// An unterminated sequence at the end of input is dropped.
pub fn strip_ansi(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut state = State::Ground;

    for c in input.chars() {
        state = match state {
            State::Ground if c == ESC => State::Escape,
            State::Ground => {
                output.push(c);
                State::Ground
            }
            State::Escape => classify(c),
            State::Csi if ('\x40'..='\x7e').contains(&c) => State::Ground,
            State::Csi => State::Csi,
            State::EscapeIntermediate if ('\x20'..='\x2f').contains(&c) => {
                State::EscapeIntermediate
            }
            State::EscapeIntermediate => State::Ground,
            State::Osc if c == BEL => State::Ground,
            State::Osc if c == ESC => State::OscEscape,
            State::Osc => State::Osc,
            State::OscEscape if c == '\\' => State::Ground,
            // Malformed ST: treat the ESC as the start of a new sequence.
            State::OscEscape => classify(c),
        };
    }

    output
}

/// State after the character following an ESC.
fn classify(c: char) -> State {
    match c {
        '[' => State::Csi,
        ']' => State::Osc,
        '\x20'..='\x2f' => State::EscapeIntermediate,
        _ => State::Ground,
    }
}
