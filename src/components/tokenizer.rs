/*
 * Command Tokenizer
 *
 * Single-pass scanner splitting a control-file write into arguments.
 * Spaces and newlines delimit; there is no quoting or escaping. Every
 * delimiter closes the current token, so two delimiters in a row produce an
 * empty token between them.
 */

use heapless::Vec;

#[inline]
fn is_delimiter(byte: u8) -> bool {
    byte == b' ' || byte == b'\n'
}

/// Split `input` into at most `N` tokens.
///
/// Input is treated as a C string and ends at the first NUL byte. A token
/// starts at the beginning of input or just after a delimiter and runs to
/// the next delimiter or the end of input. Anything after the `N`th token is
/// left unscanned.
pub fn tokenize<const N: usize>(input: &[u8]) -> Vec<&[u8], N> {
    let input = match input.iter().position(|&b| b == 0) {
        Some(nul) => &input[..nul],
        None => input,
    };

    let mut tokens = Vec::new();
    let mut start = None;

    for (i, &byte) in input.iter().enumerate() {
        if start.is_none() {
            if tokens.is_full() {
                break;
            }
            start = Some(i);
        }
        if is_delimiter(byte) {
            if let Some(begin) = start.take() {
                // Cannot fail: fullness is checked before a token opens.
                let _ = tokens.push(&input[begin..i]);
            }
        }
    }
    if let Some(begin) = start {
        let _ = tokens.push(&input[begin..]);
    }

    tokens
}
