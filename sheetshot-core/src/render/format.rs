//! Cell value to display text conversion

use crate::reader::CellValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Text and placement of one rendered cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellText {
    pub text: String,
    pub align: Align,
    /// Numbers are replaced by `#` fill instead of being clipped
    pub numeric: bool,
    pub error: bool,
}

/// Format a value the way a spreadsheet shows it. Returns `None` for empty cells.
pub fn display_value(value: &CellValue, num_fmt: Option<&str>) -> Option<CellText> {
    let (text, align) = match value {
        CellValue::Empty => return None,
        CellValue::Number(n) => {
            let text = num_fmt
                .and_then(|code| apply_format(*n, code))
                .unwrap_or_else(|| format_general(*n));
            (text, Align::Right)
        }
        CellValue::DateTime(s) => (s.clone(), Align::Right),
        CellValue::Text(s) => (single_line(s), Align::Left),
        CellValue::Boolean(b) => (if *b { "TRUE" } else { "FALSE" }.to_string(), Align::Center),
        CellValue::Error(e) => (e.clone(), Align::Center),
    };

    if text.is_empty() {
        return None;
    }

    Some(CellText {
        text,
        align,
        numeric: matches!(value, CellValue::Number(_) | CellValue::DateTime(_)),
        error: value.is_error(),
    })
}

/// Excel "General": integers as-is, otherwise up to 10 significant digits
pub fn format_general(n: f64) -> String {
    if !n.is_finite() {
        return "#NUM!".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let magnitude = n.abs();
    if !(1e-9..1e11).contains(&magnitude) {
        return format_scientific(n, 5, true);
    }
    if n.fract() == 0.0 {
        return format!("{}", n as i64);
    }

    let exponent = magnitude.log10().floor() as i32;
    let decimals = (9 - exponent).clamp(0, 15) as usize;
    trim_decimal(format!("{:.*}", decimals, n))
}

/// Apply a number format code. Returns `None` for codes that fall back to General.
pub fn apply_format(n: f64, code: &str) -> Option<String> {
    let section = code.split(';').next()?.trim();
    let section = strip_brackets(section);
    if section.is_empty() || section.eq_ignore_ascii_case("general") || section == "@" {
        return None;
    }
    if !section
        .chars()
        .all(|c| matches!(c, '0' | '#' | '.' | ',' | '%' | 'E' | 'e' | '+' | '-' | ' '))
    {
        return None;
    }

    let percent = section.contains('%');
    let upper = section.to_ascii_uppercase();
    let (mantissa, scientific) = match upper.split_once("E+").or_else(|| upper.split_once("E-")) {
        Some((mantissa, _)) => (mantissa.to_string(), true),
        None => (upper, false),
    };
    let decimals = mantissa
        .split_once('.')
        .map(|(_, frac)| frac.chars().filter(|c| matches!(c, '0' | '#')).count())
        .unwrap_or(0);
    let thousands = mantissa.split('.').next().unwrap_or_default().contains(',');

    let value = if percent { n * 100.0 } else { n };
    let body = if scientific {
        format_scientific(value, decimals, false)
    } else {
        format_fixed(value, decimals, thousands)
    };

    Some(if percent { format!("{}%", body) } else { body })
}

fn format_fixed(n: f64, decimals: usize, thousands: bool) -> String {
    let text = format!("{:.*}", decimals, n);
    if !thousands {
        return text;
    }

    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// `1234.5` with 2 decimals -> `1.23E+03`
fn format_scientific(n: f64, decimals: usize, trim: bool) -> String {
    let text = format!("{:.*e}", decimals, n);
    let Some((mantissa, exponent)) = text.split_once('e') else {
        return text;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let mantissa = if trim {
        trim_decimal(mantissa.to_string())
    } else {
        mantissa.to_string()
    };
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}E{}{:02}", mantissa, sign, exponent.abs())
}

fn trim_decimal(text: String) -> String {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Drop `[Red]`, `[$-409]` and similar bracketed modifiers
fn strip_brackets(section: &str) -> String {
    let mut out = String::new();
    let mut depth = 0;
    for ch in section.chars() {
        match ch {
            '[' => depth += 1,
            ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out.trim().to_string()
}

fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}
