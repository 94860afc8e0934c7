// Number formatting for tooltips and data labels

use tracing::warn;

use crate::config::Separators;
use crate::parser::{parse_number_format, FormatSection, FormatToken, NumberFormat};

/// Used when a measure has no format or its format cannot be parsed.
pub const DEFAULT_FORMAT: &str = "#,##0.00";

fn default_format() -> NumberFormat {
    use FormatToken::*;
    NumberFormat {
        sections: vec![FormatSection {
            condition: None,
            tokens: vec![
                DigitHash,
                Comma,
                DigitHash,
                DigitHash,
                DigitZero,
                DecimalPoint,
                DigitZero,
                DigitZero,
            ],
        }],
    }
}

fn parse_or_default(format: &str) -> NumberFormat {
    if format.trim().is_empty() {
        return default_format();
    }
    match parse_number_format(format) {
        Ok((_, parsed)) => parsed,
        Err(e) => {
            warn!(format, error = %e, "unparseable number format, using {}", DEFAULT_FORMAT);
            default_format()
        }
    }
}

/// Format `value` with an Excel-style format string.
///
/// Missing values render the `[=null]` section when there is one and an
/// empty string otherwise.
pub fn format_number(value: Option<f64>, format: &str, separators: &Separators) -> String {
    let parsed = parse_or_default(format);

    let value = match value {
        Some(v) if v.is_finite() => v,
        _ => {
            return parsed
                .null_section()
                .map(literal_text)
                .unwrap_or_default()
        }
    };

    let (section, show_minus) = select_section(value, &parsed);
    render_section(value, section, show_minus, separators)
}

/// `"{value rounded to 2 decimals}%"` without trailing zeros.
pub fn format_percent(value: f64) -> String {
    format!("{}%", round_to_places(value, 2))
}

// =============================================================================
// Section selection
// =============================================================================

/// Pick the section for `value` and whether a leading minus is still needed.
fn select_section(value: f64, format: &NumberFormat) -> (&FormatSection, bool) {
    if format.is_conditional() {
        let section = format
            .sections
            .iter()
            .find(|s| s.condition.as_ref().map_or(false, |c| c.matches(value)))
            .or_else(|| format.sections.iter().find(|s| s.condition.is_none()))
            .unwrap_or(&format.sections[0]);
        return (section, !has_minus_literal(section));
    }

    let positional: Vec<&FormatSection> = format
        .sections
        .iter()
        .filter(|s| s.condition.is_none())
        .collect();

    match positional.as_slice() {
        [] => (&format.sections[0], true),
        [only] => (*only, true),
        [positive, negative] => {
            if value < 0.0 {
                (*negative, false)
            } else {
                (*positive, true)
            }
        }
        [positive, negative, zero, ..] => {
            if value < 0.0 {
                (*negative, false)
            } else if value == 0.0 {
                (*zero, true)
            } else {
                (*positive, true)
            }
        }
    }
}

fn has_minus_literal(section: &FormatSection) -> bool {
    section
        .tokens
        .iter()
        .any(|t| matches!(t, FormatToken::Literal(s) if s.contains('-')))
}

// =============================================================================
// Rendering
// =============================================================================

fn literal_text(section: &FormatSection) -> String {
    section
        .tokens
        .iter()
        .filter_map(|t| match t {
            FormatToken::Literal(s) => Some(s.as_str()),
            FormatToken::Percent => Some("%"),
            _ => None,
        })
        .collect()
}

fn round_to_places(value: f64, places: usize) -> f64 {
    let factor = 10f64.powi(places as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

fn group_thousands(digits: &str, separator: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

fn render_section(
    value: f64,
    section: &FormatSection,
    show_minus: bool,
    separators: &Separators,
) -> String {
    if !section.has_digits() {
        return literal_text(section);
    }

    // 1. Scale
    let mut scaled = value.abs();
    if section.has_percent() {
        scaled *= 100.0;
    }
    scaled /= 1000f64.powi(section.scale_commas());

    // 2. Digits
    let (min_int, min_dec, max_dec) = section.digit_counts();
    let fixed = format!("{:.*}", max_dec, round_to_places(scaled, max_dec));
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut frac = frac_part.to_string();
    while frac.len() > min_dec && frac.ends_with('0') {
        frac.pop();
    }

    let mut int = if int_part == "0" && min_int == 0 {
        String::new()
    } else {
        int_part.to_string()
    };
    while int.len() < min_int {
        int.insert(0, '0');
    }
    if section.uses_grouping() {
        int = group_thousands(&int, &separators.thousand);
    }

    let mut number = int;
    if !frac.is_empty() {
        number.push_str(&separators.decimal);
        number.push_str(&frac);
    }

    // 3. Assemble around literals
    let mut out = String::new();
    let is_zero = !number.chars().any(|c| c.is_ascii_digit() && c != '0');
    if show_minus && value < 0.0 && !is_zero {
        out.push('-');
    }
    let mut emitted = false;
    for token in &section.tokens {
        match token {
            FormatToken::Literal(s) => out.push_str(s),
            FormatToken::Percent => out.push('%'),
            _ if !emitted => {
                out.push_str(&number);
                emitted = true;
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(value: Option<f64>, format: &str) -> String {
        format_number(value, format, &Separators::default())
    }

    #[test]
    fn test_grouped_decimals() {
        assert_eq!(fmt(Some(1234.5), "#,##0.00"), "1,234.50");
        assert_eq!(fmt(Some(-1234.5), "#,##0.00"), "-1,234.50");
        assert_eq!(fmt(Some(0.0), "#,##0"), "0");
    }

    #[test]
    fn test_custom_separators() {
        let separators = Separators {
            decimal: ",".to_string(),
            thousand: " ".to_string(),
        };
        assert_eq!(
            format_number(Some(1234567.891), "#,##0.00", &separators),
            "1 234 567,89"
        );
    }

    #[test]
    fn test_percent_and_literals() {
        assert_eq!(fmt(Some(0.256), "0.0%"), "25.6%");
        assert_eq!(fmt(Some(1234567.0), "$#,##0"), "$1,234,567");
        assert_eq!(fmt(Some(1.2), "0.0#"), "1.2");
        assert_eq!(fmt(Some(1.234), "0.0#"), "1.23");
    }

    #[test]
    fn test_trailing_comma_scales() {
        assert_eq!(fmt(Some(12345.0), "#,##0,K"), "12K");
        assert_eq!(fmt(Some(2500000.0), r#"0.0,,"M""#), "2.5M");
    }

    #[test]
    fn test_conditional_sections() {
        let format = r#"[>=1000]#,##0,"K";#,##0"#;
        assert_eq!(fmt(Some(999.0), format), "999");
        assert_eq!(fmt(Some(1500.0), format), "2K");
    }

    #[test]
    fn test_negative_section() {
        assert_eq!(fmt(Some(-5.0), "#,##0.00;(#,##0.00)"), "(5.00)");
        assert_eq!(fmt(Some(0.0), "0;-0;\"zero\""), "zero");
    }

    #[test]
    fn test_null_values() {
        assert_eq!(fmt(None, "[=null]n/a;#,##0"), "n/a");
        assert_eq!(fmt(Some(3.0), "[=null]n/a;#,##0"), "3");
        assert_eq!(fmt(None, "#,##0"), "");
    }

    #[test]
    fn test_color_tags_are_stripped() {
        assert_eq!(fmt(Some(42.0), "[red]#,##0"), "42");
    }

    #[test]
    fn test_unparseable_format_falls_back() {
        assert_eq!(fmt(Some(1234.5), "\"oops"), "1,234.50");
        assert_eq!(fmt(Some(1234.5), ""), "1,234.50");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(33.33333), "33.33%");
        assert_eq!(format_percent(50.0), "50%");
    }
}
