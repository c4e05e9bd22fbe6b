//! Expanding a collapsed caret to the word around it.

use super::{Paragraph, Segment, SegmentKind};

fn is_word_break(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | ',' | '?' | '!' | ':' | '"' | '(' | ')' | '[' | ']' | '\\' | '/')
}

fn split_segment(segment: &mut Segment, at_char: usize) -> Segment {
    let mut tail = segment.clone();
    if let SegmentKind::Text { text } = &mut segment.kind {
        let byte = text
            .char_indices()
            .nth(at_char)
            .map(|(b, _)| b)
            .unwrap_or(text.len());
        let rest = text.split_off(byte);
        tail.kind = SegmentKind::Text { text: rest };
    }
    tail
}

/// Splits text segments around the selection marker at `marker_index` so the
/// word touching the caret consists of whole segments, and returns the
/// indices of those segments (marker included). Returns just the marker when
/// the caret does not touch a word.
pub fn adjust_word_selection(paragraph: &mut Paragraph, marker_index: usize) -> Vec<usize> {
    let segments = &mut paragraph.segments;
    if !segments.get(marker_index).is_some_and(Segment::is_marker) {
        return vec![marker_index];
    }

    let mut marker = marker_index;
    let mut start = marker_index;
    let mut i = marker_index;
    while i > 0 {
        let index = i - 1;
        let Some(text) = segments[index].text_value() else {
            break;
        };
        let chars: Vec<char> = text.chars().collect();
        let last_break = chars.iter().rposition(|&c| is_word_break(c));
        match last_break {
            None => {
                start = index;
                i -= 1;
            }
            Some(position) => {
                if position + 1 < chars.len() {
                    let tail = split_segment(&mut segments[index], position + 1);
                    segments.insert(index + 1, tail);
                    start = index + 1;
                    marker += 1;
                }
                break;
            }
        }
    }

    let mut end = marker;
    let mut j = marker + 1;
    while j < segments.len() {
        let Some(text) = segments[j].text_value() else {
            break;
        };
        let first_break = text.chars().position(is_word_break);
        match first_break {
            None => {
                end = j;
                j += 1;
            }
            Some(position) => {
                if position > 0 {
                    let tail = split_segment(&mut segments[j], position);
                    segments.insert(j + 1, tail);
                    end = j;
                }
                break;
            }
        }
    }

    (start..=end).collect()
}
