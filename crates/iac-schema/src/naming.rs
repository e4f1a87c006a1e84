//! Name conversions between SDK field names and schema display names.

/// Convert a `PascalCase` SDK name to a `snake_case` display name.
///
/// Acronym runs stay together: `IPAddress` → `ip_address`,
/// `UserAssignedIdentities` → `user_assigned_identities`.
pub(crate) fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' || c == '.' || c == '_' {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            continue;
        }

        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(char::is_ascii_lowercase);
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower);
            if boundary && !result.ends_with('_') {
                result.push('_');
            }
        }
        result.push(c.to_ascii_lowercase());
    }

    result
}

/// Upper-case the first character: `namespace` → `Namespace`.
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Best-effort singular of a `PascalCase` plural: `Subnets` → `Subnet`,
/// `Addresses` → `Address`, `Policies` → `Policy`. Names that do not look
/// plural (`Status`, `Access`) are returned unchanged.
pub(crate) fn singular(s: &str) -> String {
    if let Some(stem) = s.strip_suffix("ies").filter(|stem| !stem.is_empty()) {
        return format!("{stem}y");
    }
    if ["sses", "xes", "ches", "shes"].iter().any(|suffix| s.ends_with(suffix)) {
        return s[..s.len() - 2].to_string();
    }
    if s.ends_with("ss") || s.ends_with("us") {
        return s.to_string();
    }
    s.strip_suffix('s').unwrap_or(s).to_string()
}
