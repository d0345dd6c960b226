//! Selector globbing over segmented identifiers.
//!
//! Tokens are `-`-joined segments of `[A-Za-z0-9_]+`, optionally
//! `$`-prefixed in the first segment. Patterns extend the token grammar
//! per segment with `*` (matches any run of segments), `?` (matches one
//! segment), `{a,b}` alternation, and `{m..n}` numeric ranges. Ranges
//! zero-pad their output when either endpoint carries a leading zero and
//! the wider endpoint has more than one digit, so `{08..10}` expands to
//! `08 09 10`.

use crate::error::GlobError;

/// Whether `token` is a plain selector token (no pattern syntax).
#[must_use]
pub fn is_valid_token(token: &str) -> bool {
    let body = token.strip_prefix('$').unwrap_or(token);
    !body.is_empty() && body.split('-').all(is_part)
}

/// Whether `pattern` is a well-formed selector pattern.
#[must_use]
pub fn is_valid_pattern(pattern: &str) -> bool {
    let Ok(parts) = split_pattern(pattern) else {
        return false;
    };
    parts.iter().enumerate().all(|(index, part)| {
        if *part == "*" || *part == "?" {
            return true;
        }
        if is_group(part) {
            return validate_group(part, index == 0).is_ok();
        }
        is_valid_literal(part, index == 0)
    })
}

/// Upper bound on the expansion size of any pattern consistent with
/// `pattern`, assuming each wildcard segment matches at most
/// `wildcard_match_count` candidates. Saturates instead of overflowing.
pub fn get_upper_expansion_limit(
    pattern: &str,
    wildcard_match_count: usize,
) -> Result<usize, GlobError> {
    let parts = split_pattern(pattern)?;
    let mut count: usize = 1;
    for (index, part) in parts.iter().enumerate() {
        if is_group(part) {
            count = count.saturating_mul(group_size(part, index == 0)?);
        }
    }
    if parts.iter().any(|part| *part == "*" || *part == "?") {
        return Ok(count.saturating_mul(wildcard_match_count));
    }
    Ok(count)
}

/// Expand a wildcard-free pattern into the full token list.
///
/// # Errors
///
/// [`GlobError::WildcardExpansion`] if the pattern contains `*` or `?`;
/// pattern-grammar errors otherwise.
pub fn expand(pattern: &str) -> Result<Vec<String>, GlobError> {
    let parts = split_pattern(pattern)?;
    if parts.iter().any(|part| *part == "*" || *part == "?") {
        return Err(GlobError::WildcardExpansion);
    }

    let mut expanded: Vec<Vec<String>> = Vec::with_capacity(parts.len());
    for (index, part) in parts.iter().enumerate() {
        if is_group(part) {
            expanded.push(expand_group(part, index == 0)?);
        } else {
            if !is_valid_literal(part, index == 0) {
                return Err(GlobError::InvalidLiteral);
            }
            expanded.push(vec![(*part).to_string()]);
        }
    }
    Ok(cartesian_join(&expanded))
}

/// Select the members of `scope` whose key matches `pattern`, preserving
/// scope order and deduplicating by key.
pub fn select<'a, T>(
    pattern: &str,
    scope: &'a [T],
    key: impl Fn(&T) -> &str,
) -> Result<Vec<&'a T>, GlobError> {
    let parts = split_pattern(pattern)?;
    let mut expanded: Vec<Vec<String>> = Vec::with_capacity(parts.len());
    for (index, part) in parts.iter().enumerate() {
        if is_group(part) {
            expanded.push(expand_group(part, index == 0)?);
        } else {
            expanded.push(vec![(*part).to_string()]);
        }
    }
    let patterns: Vec<Vec<String>> = cartesian_join(&expanded)
        .into_iter()
        .map(|candidate| candidate.split('-').map(str::to_string).collect())
        .collect();

    let mut selected = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    for item in scope {
        let token = key(item);
        if seen.contains(&token) {
            continue;
        }
        let token_parts: Vec<&str> = token.split('-').collect();
        if patterns.iter().any(|pattern_parts| matches(pattern_parts, &token_parts)) {
            selected.push(item);
            seen.push(token);
        }
    }
    Ok(selected)
}

/// Two-pointer wildcard match of pattern segments against token
/// segments. `*` may absorb any number of segments; on a mismatch the
/// match point after the last `*` advances and the token rewinds.
fn matches(pattern_parts: &[String], token_parts: &[&str]) -> bool {
    let mut pi = 0;
    let mut ti = 0;
    let mut star_index = None;
    let mut match_index = 0;

    while ti < token_parts.len() {
        if pi < pattern_parts.len() && pattern_parts[pi] == "*" {
            star_index = Some(pi);
            match_index = ti;
            pi += 1;
            continue;
        }
        if pi < pattern_parts.len()
            && (pattern_parts[pi] == "?" || pattern_parts[pi] == token_parts[ti])
        {
            pi += 1;
            ti += 1;
            continue;
        }
        if let Some(star) = star_index {
            pi = star + 1;
            match_index += 1;
            ti = match_index;
            continue;
        }
        return false;
    }

    while pi < pattern_parts.len() && pattern_parts[pi] == "*" {
        pi += 1;
    }
    pi == pattern_parts.len()
}

fn is_part(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn is_group(part: &str) -> bool {
    part.starts_with('{') && part.ends_with('}')
}

fn is_valid_literal(part: &str, allow_reserved: bool) -> bool {
    if part == "*" || part == "?" {
        return true;
    }
    if allow_reserved && part.starts_with('$') {
        return is_valid_token(part);
    }
    !part.starts_with('$') && is_valid_token(part)
}

/// Split a pattern on `-` at brace depth zero, keeping groups intact.
fn split_pattern(pattern: &str) -> Result<Vec<&str>, GlobError> {
    if pattern.is_empty() {
        return Err(GlobError::InvalidPattern("empty pattern"));
    }
    let mut parts = Vec::new();
    let mut start = 0;
    let mut depth = 0u8;
    for (offset, ch) in pattern.char_indices() {
        match ch {
            '{' if depth == 0 => depth = 1,
            '{' => return Err(GlobError::InvalidPattern("nested group")),
            '}' if depth == 0 => {
                return Err(GlobError::InvalidPattern("unexpected closing brace"));
            }
            '}' => depth = 0,
            '-' if depth == 0 => {
                if offset == start {
                    return Err(GlobError::InvalidPattern("empty part"));
                }
                parts.push(&pattern[start..offset]);
                start = offset + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(GlobError::InvalidPattern("unterminated group"));
    }
    if start == pattern.len() {
        return Err(GlobError::InvalidPattern("empty part"));
    }
    parts.push(&pattern[start..]);
    Ok(parts)
}

fn group_body(part: &str) -> &str {
    &part[1..part.len() - 1]
}

fn validate_group(part: &str, allow_reserved: bool) -> Result<(), GlobError> {
    let body = group_body(part);
    if body.contains("..") {
        range_bounds(body).map(|_| ())
    } else {
        group_items(body, allow_reserved).map(|_| ())
    }
}

fn group_items(body: &str, allow_reserved: bool) -> Result<Vec<&str>, GlobError> {
    let items: Vec<&str> = body.split(',').collect();
    for item in &items {
        if item.is_empty() {
            return Err(GlobError::InvalidPattern("empty group item"));
        }
        let valid = if allow_reserved && item.starts_with('$') {
            is_valid_token(item)
        } else {
            is_part(item)
        };
        if !valid {
            return Err(GlobError::InvalidLiteral);
        }
    }
    Ok(items)
}

fn range_bounds(body: &str) -> Result<(&str, &str), GlobError> {
    let (start, end) = body.split_once("..").ok_or(GlobError::InvalidRange)?;
    let numeric = |text: &str| !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit());
    if !numeric(start) || !numeric(end) {
        return Err(GlobError::InvalidRange);
    }
    Ok((start, end))
}

fn expand_group(part: &str, allow_reserved: bool) -> Result<Vec<String>, GlobError> {
    let body = group_body(part);
    if body.contains("..") {
        return expand_range(body);
    }
    Ok(group_items(body, allow_reserved)?.into_iter().map(str::to_string).collect())
}

fn expand_range(body: &str) -> Result<Vec<String>, GlobError> {
    let (start_text, end_text) = range_bounds(body)?;
    let start: u64 = start_text.parse().map_err(|_| GlobError::InvalidRange)?;
    let end: u64 = end_text.parse().map_err(|_| GlobError::InvalidRange)?;
    if start > end {
        return Err(GlobError::InvalidRange);
    }

    let has_leading_zero = |text: &str| text.len() > 1 && text.starts_with('0');
    let max_width = start_text.len().max(end_text.len());
    let width = if (has_leading_zero(start_text) || has_leading_zero(end_text)) && max_width > 1
    {
        max_width
    } else {
        0
    };

    Ok((start..=end).map(|number| format!("{number:0width$}")).collect())
}

fn group_size(part: &str, allow_reserved: bool) -> Result<usize, GlobError> {
    let body = group_body(part);
    if body.contains("..") {
        let (start_text, end_text) = range_bounds(body)?;
        let start: u64 = start_text.parse().map_err(|_| GlobError::InvalidRange)?;
        let end: u64 = end_text.parse().map_err(|_| GlobError::InvalidRange)?;
        if start > end {
            return Err(GlobError::InvalidRange);
        }
        Ok((end - start + 1) as usize)
    } else {
        Ok(group_items(body, allow_reserved)?.len())
    }
}

/// Cartesian product of per-part alternatives, joined back with `-`.
fn cartesian_join(parts: &[Vec<String>]) -> Vec<String> {
    let mut combos = vec![String::new()];
    for (index, alternatives) in parts.iter().enumerate() {
        let mut next = Vec::with_capacity(combos.len() * alternatives.len());
        for combo in &combos {
            for alternative in alternatives {
                if index == 0 {
                    next.push(alternative.clone());
                } else {
                    next.push(format!("{combo}-{alternative}"));
                }
            }
        }
        combos = next;
    }
    combos
}
