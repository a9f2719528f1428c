use regex::Regex;
use serde::{
    Deserialize,
    Serialize,
};

use crate::core::{
    FlashnoteError,
    Side,
};

/// Slot delimiters as they appear in template text: `\{` opens a slot, `}\`
/// closes it.
pub const SLOT_OPEN: &str = "\\{";
pub const SLOT_CLOSE: &str = "}\\";

// Separates the front segments from the back segments in the combined scan; an
// empty slot, so it can never collide with a real field name.
const SENTINEL: &str = "\\{}\\";

const DELIMITER_PATTERN: &str = r"\\\{|\}\\";

/// A reusable card pattern. `fields` is derived from the sides at creation
/// time, never set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub front: String,
    pub back: String,
    pub fields: Vec<String>,
}

impl Template {
    pub fn new(front: String, back: String) -> Result<Self, FlashnoteError> {
        let fields = parse_fields(&front, &back)?;
        Ok(Template { front, back, fields })
    }

    /// Materializes a card from this template. `values` fills the slots in
    /// order of appearance, front before back, one value per occurrence.
    pub fn fill(&self, values: &[String]) -> Result<(String, String), FlashnoteError> {
        let delimiter = Regex::new(DELIMITER_PATTERN)?;
        let mut front_segments: Vec<String> =
            delimiter.split(&self.front).map(String::from).collect();
        let mut back_segments: Vec<String> =
            delimiter.split(&self.back).map(String::from).collect();

        // A validated side always splits into 2k+1 segments for k slots
        let total_slots = front_segments.len() / 2 + back_segments.len() / 2;
        if values.len() != total_slots {
            return Err(FlashnoteError::FieldCountMismatch {
                expected: total_slots,
                got: values.len(),
            });
        }

        let mut next_value = 0;
        substitute(&mut front_segments, values, &mut next_value)?;
        substitute(&mut back_segments, values, &mut next_value)?;

        Ok((front_segments.concat(), back_segments.concat()))
    }

    pub fn slot_count(&self) -> usize {
        self.fields.len()
    }
}

/// Extracts the ordered field names from a template's sides. Both sides are
/// validated independently before the split; a malformed side fails with
/// `UnbalancedDelimiters` and no template is created.
pub fn parse_fields(front: &str, back: &str) -> Result<Vec<String>, FlashnoteError> {
    validate_side(front, Side::Front)?;
    validate_side(back, Side::Back)?;

    let delimiter = Regex::new(DELIMITER_PATTERN)?;
    let mut segments: Vec<&str> = delimiter.split(front).collect();
    segments.push(SENTINEL);
    segments.extend(delimiter.split(back));

    // Odd-indexed segments are slot contents; the sentinel keeps the parity of
    // the back half aligned and is skipped itself
    let mut fields = Vec::new();
    let mut i = 1;
    while i < segments.len() {
        if segments[i] != SENTINEL {
            fields.push(segments[i].to_string());
        }
        i += 2;
    }
    Ok(fields)
}

// Left-to-right scan tracking whether we are inside a slot. Opening a slot
// inside a slot, closing one outside, or running off the end while inside all
// mean the template is malformed.
fn validate_side(text: &str, side: Side) -> Result<(), FlashnoteError> {
    let bytes = text.as_bytes();
    let mut inside = false;
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'\\' && bytes[i + 1] == b'{' {
            if inside {
                return Err(FlashnoteError::UnbalancedDelimiters(side));
            }
            inside = true;
            i += 2;
        } else if bytes[i] == b'}' && bytes[i + 1] == b'\\' {
            if !inside {
                return Err(FlashnoteError::UnbalancedDelimiters(side));
            }
            inside = false;
            i += 2;
        } else {
            i += 1;
        }
    }
    if inside {
        return Err(FlashnoteError::UnbalancedDelimiters(side));
    }
    Ok(())
}

fn substitute(
    segments: &mut [String],
    values: &[String],
    next_value: &mut usize,
) -> Result<(), FlashnoteError> {
    let mut i = 1;
    while i < segments.len() {
        let value = &values[*next_value];
        if value.is_empty() {
            return Err(FlashnoteError::MissingFieldValue(segments[i].clone()));
        }
        segments[i] = value.clone();
        *next_value += 1;
        i += 2;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_fields_front_before_back() {
        let fields =
            parse_fields("Word: \\{word}\\ (\\{reading}\\)", "Meaning: \\{meaning}\\").unwrap();
        assert_eq!(fields, values(&["word", "reading", "meaning"]));
    }

    #[test]
    fn test_parse_fields_keeps_duplicates_as_separate_slots() {
        let fields = parse_fields("\\{word}\\ and \\{word}\\", "\\{word}\\").unwrap();
        assert_eq!(fields, values(&["word", "word", "word"]));
    }

    #[test]
    fn test_parse_fields_no_slots() {
        assert!(parse_fields("plain front", "plain back").unwrap().is_empty());
    }

    #[test]
    fn test_unmatched_open_fails() {
        let err = parse_fields("A \\{B", "").unwrap_err();
        assert!(matches!(err, FlashnoteError::UnbalancedDelimiters(Side::Front)));
    }

    #[test]
    fn test_nested_open_fails() {
        let err = parse_fields("", "\\{a \\{b}\\").unwrap_err();
        assert!(matches!(err, FlashnoteError::UnbalancedDelimiters(Side::Back)));
    }

    #[test]
    fn test_stray_close_fails() {
        let err = parse_fields("a}\\ b", "").unwrap_err();
        assert!(matches!(err, FlashnoteError::UnbalancedDelimiters(Side::Front)));
    }

    #[test]
    fn test_fill_round_trip() {
        let template = Template::new(
            "Hello \\{name}\\!".to_string(),
            "\\{greeting}\\, \\{name}\\.".to_string(),
        )
        .unwrap();
        assert_eq!(template.fields, values(&["name", "greeting", "name"]));

        let (front, back) = template.fill(&values(&["Ada", "Goodbye", "Bob"])).unwrap();
        assert_eq!(front, "Hello Ada!");
        assert_eq!(back, "Goodbye, Bob.");
    }

    #[test]
    fn test_fill_requires_one_value_per_occurrence() {
        let template =
            Template::new("\\{word}\\ \\{word}\\".to_string(), String::new()).unwrap();
        let err = template.fill(&values(&["only-one"])).unwrap_err();
        assert!(matches!(err, FlashnoteError::FieldCountMismatch { expected: 2, got: 1 }));
    }

    #[test]
    fn test_fill_rejects_empty_value() {
        let template = Template::new("\\{word}\\".to_string(), String::new()).unwrap();
        let err = template.fill(&values(&[""])).unwrap_err();
        match err {
            FlashnoteError::MissingFieldValue(field) => assert_eq!(field, "word"),
            other => panic!("expected MissingFieldValue, got {:?}", other),
        }
    }

    #[test]
    fn test_fill_empty_template() {
        let template = Template::new(String::new(), String::new()).unwrap();
        let (front, back) = template.fill(&[]).unwrap();
        assert_eq!(front, "");
        assert_eq!(back, "");
    }
}
