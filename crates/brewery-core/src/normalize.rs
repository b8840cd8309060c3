use serde::Serialize;

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥'];

/// A price or cost as it arrives from the source tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawAmount<'a> {
    Number(f64),
    Text(&'a str),
}

/// Outcome of lenient currency parsing. Aggregations must match on the variant;
/// `Unparseable` never stands in for zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CurrencyValue {
    Numeric(f64),
    Unparseable,
}

impl CurrencyValue {
    pub fn numeric(self) -> Option<f64> {
        match self {
            CurrencyValue::Numeric(value) => Some(value),
            CurrencyValue::Unparseable => None,
        }
    }

    pub fn is_unparseable(&self) -> bool {
        matches!(self, CurrencyValue::Unparseable)
    }
}

/// Strips a leading currency symbol and well-formed thousands separators, then
/// parses. Anything that does not yield a finite number is `Unparseable`,
/// including commas outside `d,ddd` groups such as `1,20`.
pub fn normalize_currency(raw: RawAmount<'_>) -> CurrencyValue {
    match raw {
        RawAmount::Number(value) if value.is_finite() => CurrencyValue::Numeric(value),
        RawAmount::Number(_) => CurrencyValue::Unparseable,
        RawAmount::Text(text) => parse_currency_text(text),
    }
}

/// Normalizes a nullable text cell; SQL NULL is unparseable.
pub fn normalize_optional_text(raw: Option<&str>) -> CurrencyValue {
    raw.map_or(CurrencyValue::Unparseable, |text| {
        normalize_currency(RawAmount::Text(text))
    })
}

fn parse_currency_text(text: &str) -> CurrencyValue {
    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let unsigned = unsigned
        .strip_prefix(CURRENCY_SYMBOLS)
        .unwrap_or(unsigned)
        .trim_start();
    let Some(cleaned) = strip_thousands_separators(unsigned) else {
        return CurrencyValue::Unparseable;
    };

    if cleaned.is_empty() {
        return CurrencyValue::Unparseable;
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            CurrencyValue::Numeric(if negative { -value } else { value })
        }
        _ => CurrencyValue::Unparseable,
    }
}

/// Removes commas only when the integer part is grouped as `d{1,3}(,ddd)+`.
/// `None` means the commas are misplaced and the text must not be guessed at.
fn strip_thousands_separators(text: &str) -> Option<String> {
    if !text.contains(',') {
        return Some(text.to_string());
    }

    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (text, None),
    };
    if fraction.is_some_and(|fraction| fraction.contains(',')) {
        return None;
    }

    let mut groups = integer.split(',');
    let lead = groups.next()?;
    if !(1..=3).contains(&lead.len()) || !lead.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut cleaned = lead.to_string();
    for group in groups {
        if group.len() != 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        cleaned.push_str(group);
    }
    if let Some(fraction) = fraction {
        cleaned.push('.');
        cleaned.push_str(fraction);
    }
    Some(cleaned)
}

/// Mean over the numeric values only; `None` when nothing was parseable.
pub fn mean_of_numeric<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = CurrencyValue>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        if let CurrencyValue::Numeric(amount) = value {
            sum += amount;
            count += 1;
        }
    }
    (count > 0).then(|| sum / count as f64)
}
