/// Split a scoped name into its segments.
///
/// # Examples
/// ```
/// use slicegen_core::utils::scoped_segments;
/// assert_eq!(scoped_segments("::Demo::Hello"), vec!["Demo", "Hello"]);
/// ```
pub fn scoped_segments(scoped: &str) -> Vec<&str> {
    scoped.split("::").filter(|s| !s.is_empty()).collect()
}

/// Last segment of a scoped name.
///
/// # Examples
/// ```
/// use slicegen_core::utils::unscoped;
/// assert_eq!(unscoped("::Demo::Color::red"), "red");
/// assert_eq!(unscoped("red"), "red");
/// ```
pub fn unscoped(scoped: &str) -> &str {
    scoped.rsplit("::").next().unwrap_or(scoped)
}

/// Uppercase the first character, leaving the rest untouched.
///
/// # Examples
/// ```
/// use slicegen_core::utils::capitalize;
/// assert_eq!(capitalize("returnValue"), "ReturnValue");
/// ```
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Integer literal in decimal, hex (`0x`) or octal (leading `0`) notation.
///
/// # Examples
/// ```
/// use slicegen_core::utils::parse_integer;
/// assert_eq!(parse_integer("0xFF"), Some(255));
/// assert_eq!(parse_integer("-017"), Some(-15));
/// assert_eq!(parse_integer("ten"), None);
/// ```
pub fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let value = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse().ok()?
    };
    Some(if negative { -value } else { value })
}
