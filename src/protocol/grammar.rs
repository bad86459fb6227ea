//! Line grammar for the control surface wire protocol
//!
//! The firmware prints one frame per line:
//!
//! - sliders: `512|1023|0\r\n`, pipe-separated groups of 1-4 digits
//! - buttons: `~0~1~0~\r\n`, tilde-delimited single digits
//!
//! Anything else (boot banners, torn reads right after connect, line noise)
//! classifies as [`Frame::Malformed`] and is dropped by the caller. Parsing
//! never fails and never panics, whatever bytes arrive.

use crate::types::{MAX_RAW_BUTTON_VALUE, MAX_RAW_SLIDER_VALUE};

/// Line terminator every frame must carry
const LINE_TRAILER: &str = "\r\n";

/// Separator between slider readings
const SLIDER_DELIMITER: char = '|';

/// Separator and outer marker of button frames
const BUTTON_DELIMITER: char = '~';

/// Widest slider field accepted by the grammar
const MAX_SLIDER_DIGITS: usize = 4;

/// Raw slider readings, one per channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliderFrame {
    pub values: Vec<u16>,
}

/// Raw button states, one per channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonFrame {
    pub values: Vec<u8>,
}

/// Classification of a single raw line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Sliders(SliderFrame),
    Buttons(ButtonFrame),
    Malformed,
}

/// Classify and parse one raw line.
///
/// The button grammar is checked first, then the slider grammar.
pub fn parse_line(line: &str) -> Frame {
    if let Some(body) = match_button_line(line) {
        return parse_buttons(body);
    }
    if let Some(body) = match_slider_line(line) {
        return parse_sliders(body);
    }
    Frame::Malformed
}

/// Returns the text between the outer markers if `line` is `~d(~d)*~\r\n`
fn match_button_line(line: &str) -> Option<&str> {
    let body = line
        .strip_suffix(LINE_TRAILER)?
        .strip_prefix(BUTTON_DELIMITER)?
        .strip_suffix(BUTTON_DELIMITER)?;

    let well_formed = body
        .split(BUTTON_DELIMITER)
        .all(|field| field.len() == 1 && field.bytes().all(|b| b.is_ascii_digit()));

    well_formed.then_some(body)
}

/// Returns the line without its trailer if `line` is `d{1,4}(|d{1,4})*\r\n`
fn match_slider_line(line: &str) -> Option<&str> {
    let body = line.strip_suffix(LINE_TRAILER)?;

    let well_formed = body.split(SLIDER_DELIMITER).all(|field| {
        (1..=MAX_SLIDER_DIGITS).contains(&field.len()) && field.bytes().all(|b| b.is_ascii_digit())
    });

    well_formed.then_some(body)
}

fn parse_buttons(body: &str) -> Frame {
    // Fields are independent: a field that fails to parse reads as 0
    let values: Vec<u8> = body
        .split(BUTTON_DELIMITER)
        .map(|field| field.parse().unwrap_or(0))
        .collect();

    match values.first() {
        Some(&first) if first <= MAX_RAW_BUTTON_VALUE => Frame::Buttons(ButtonFrame { values }),
        _ => {
            tracing::debug!("Got malformed button line from serial, ignoring: {:?}", body);
            Frame::Malformed
        }
    }
}

fn parse_sliders(body: &str) -> Frame {
    let values: Vec<u16> = body
        .split(SLIDER_DELIMITER)
        .map(|field| field.parse().unwrap_or(0))
        .collect();

    // A torn first read right after connect typically shows up as an
    // out-of-range first field, e.g. "4558|925|41|643|220"
    match values.first() {
        Some(&first) if first <= MAX_RAW_SLIDER_VALUE => Frame::Sliders(SliderFrame { values }),
        _ => {
            tracing::debug!("Got malformed slider line from serial, ignoring: {:?}", body);
            Frame::Malformed
        }
    }
}
