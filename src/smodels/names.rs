//! Name-based directive recovery: smodels has no native edge/heuristic
//! directives, so clasp encodes them as atoms named `_edge(s,t)` /
//! `_acyc_k_s_t` and `_heuristic(atom,type,bias[,prio])` in the symbol
//! table. [`match_edge`]/[`match_heuristic`] recognize these on read;
//! the converter (C7) synthesizes the same names on write.

use crate::types::HeuristicType;

/// Splits the interior of a parenthesized argument list at top-level
/// commas, respecting nested parens and `"`-quoted (backslash-escaped)
/// substrings. Returns `None` if parens/quotes are unbalanced.
pub fn split_args(s: &str) -> Option<Vec<&str>> {
    let bytes = s.as_bytes();
    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            b',' if depth == 0 => {
                args.push(&s[start..i]);
                start = i + 1;
            }
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                if i >= bytes.len() {
                    return None;
                }
            }
            _ => {}
        }
        i += 1;
    }
    if depth != 0 {
        return None;
    }
    args.push(&s[start..]);
    Some(args)
}

/// Recognizes `_edge(s,t)` or `_acyc_k_s_t`, returning the two node labels.
pub fn match_edge(name: &str) -> Option<(&str, &str)> {
    if let Some(rest) = name.strip_prefix("_acyc_") {
        let parts: Vec<&str> = rest.split('_').collect();
        if parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit())) {
            return Some((parts[1], parts[2]));
        }
        return None;
    }
    let inner = name.strip_prefix("_edge(")?.strip_suffix(')')?;
    let args = split_args(inner)?;
    if args.len() != 2 {
        return None;
    }
    Some((args[0], args[1]))
}

/// Recognizes `_heuristic(atom,type,bias[,prio])`, returning the
/// modified atom's name, kind, bias, and priority (defaulting to
/// `|bias|` when omitted, matching the source).
pub fn match_heuristic(name: &str) -> Option<(&str, HeuristicType, i32, u32)> {
    let inner = name.strip_prefix("_heuristic(")?.strip_suffix(')')?;
    let args = split_args(inner)?;
    if args.len() < 3 || args.len() > 4 {
        return None;
    }
    let atom = args[0];
    let kind = match args[1] {
        "level" => HeuristicType::Level,
        "sign" => HeuristicType::Sign,
        "factor" => HeuristicType::Factor,
        "init" => HeuristicType::Init,
        "true" => HeuristicType::True,
        "false" => HeuristicType::False,
        _ => return None,
    };
    let bias: i32 = args[2].trim().parse().ok()?;
    let prio: u32 = if args.len() == 4 { args[3].trim().parse().ok()? } else { bias.unsigned_abs() };
    Some((atom, kind, bias, prio))
}
