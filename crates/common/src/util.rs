//! String helpers shared by the translator and printers

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};

/// Uppercase the first character, leaving the rest untouched
///
/// # Examples
/// ```
/// use apigen_common::util::capitalize;
///
/// assert_eq!(capitalize("roomId"), "RoomId");
/// assert_eq!(capitalize(""), "");
/// ```
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `lowerCamelCase` spelling of an identifier (`room_id` → `roomId`)
pub fn camel_case(s: &str) -> String {
    s.to_lower_camel_case()
}

/// `UpperCamelCase` spelling of an identifier (`room_event` → `RoomEvent`)
pub fn type_case(s: &str) -> String {
    s.to_upper_camel_case()
}

/// `snake_case` spelling of an identifier (`roomId` → `room_id`)
pub fn snake_case(s: &str) -> String {
    s.to_snake_case()
}

/// `path` with `suffix` removed, if it ends with it
pub fn without_suffix<'a>(path: &'a str, suffix: &str) -> &'a str {
    path.strip_suffix(suffix).unwrap_or(path)
}

/// `scope.name`, or just `name` for an empty scope
pub fn qualified_name(scope: &str, name: &str) -> String {
    let name = if name.is_empty() { "(anonymous)" } else { name };
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}.{name}")
    }
}
