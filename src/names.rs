//! Name Resolution
//!
//! Canonical type names are PascalCase, member/tag names camelCase. The
//! NamingRegistry is the run-scoped authority that guarantees every generated
//! name is unique: collisions resolve deterministically by integer suffixing.
//! It is always passed by reference into synthesis calls, never a hidden
//! module-level singleton.

use std::collections::HashSet;

/// Run-scoped set of claimed identifiers.
///
/// `claim` is the single mutation point and is monotonic within a run: a name
/// it has returned is never reassigned.
#[derive(Debug, Default)]
pub struct NamingRegistry {
    claimed: HashSet<String>,
}

impl NamingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `candidate`, or the first unclaimed `candidate{n}` with n
    /// counting up from 2
    pub fn claim(&mut self, candidate: &str) -> String {
        if self.claimed.insert(candidate.to_string()) {
            return candidate.to_string();
        }
        let mut counter = 2usize;
        loop {
            let suffixed = format!("{candidate}{counter}");
            if self.claimed.insert(suffixed.clone()) {
                return suffixed;
            }
            counter += 1;
        }
    }

    pub fn is_claimed(&self, name: &str) -> bool {
        self.claimed.contains(name)
    }

    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }
}

/// Convert a schema name to a canonical PascalCase type name.
///
/// Existing casing of already-cased parts is preserved so acronym-heavy names
/// survive (`RpcStatus_ERROR` -> `RpcStatusERROR`).
pub fn to_type_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    if name.contains('_') {
        return name
            .split('_')
            .map(|part| {
                if part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
                    capitalize(part)
                } else {
                    part.to_string()
                }
            })
            .collect();
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => first.to_uppercase().chain(chars).collect(),
        _ => name.to_string(),
    }
}

/// Convert a property or tag name to camelCase.
///
/// Digit runs flanked by letters get their letters uppercased so names like
/// `p2p` become `P2P` mid-word rather than `P2p`.
pub fn to_member_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    if name.contains('_') {
        let mut parts = name.split('_');
        let first = parts.next().unwrap_or_default().to_lowercase();
        let rest: String = parts.map(transform_member_part).collect();
        return first + &rest;
    }
    if name.len() > 1 && name.chars().all(|c| c.is_ascii_uppercase()) {
        return name.to_lowercase();
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn transform_member_part(part: &str) -> String {
    if part.is_empty() {
        return String::new();
    }
    if part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
        if has_inner_digit_run(part) {
            return part
                .chars()
                .map(|c| c.to_ascii_uppercase())
                .collect();
        }
        return capitalize(part);
    }
    if part.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        return part.to_string();
    }
    capitalize_first(part)
}

fn has_inner_digit_run(part: &str) -> bool {
    let digit_positions: Vec<usize> = part
        .char_indices()
        .filter(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i)
        .collect();
    match (digit_positions.first(), digit_positions.last()) {
        (Some(&first), Some(&last)) => {
            let before = part[..first].chars().any(|c| c.is_alphabetic());
            let after = part[last + 1..].chars().any(|c| c.is_alphabetic());
            before && after
        }
        _ => false,
    }
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn capitalize_first(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turn an arbitrary enum literal into a valid case name: punctuation becomes
/// underscores, camelCased, and a leading digit gets a `val` prefix
pub fn to_case_name(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| match c {
            '-' | ' ' | '.' | '/' | '@' => '_',
            other => other,
        })
        .collect();
    let name = to_member_name(&cleaned);
    match name.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("val{name}"),
        Some(_) => name,
        None => "value".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_and_suffix() {
        let mut registry = NamingRegistry::new();
        assert_eq!(registry.claim("Block"), "Block");
        assert_eq!(registry.claim("Block"), "Block2");
        assert_eq!(registry.claim("Block"), "Block3");
        assert!(registry.is_claimed("Block2"));
    }

    #[test]
    fn test_claim_is_monotonic() {
        let mut registry = NamingRegistry::new();
        let first = registry.claim("Tx");
        let second = registry.claim("Tx");
        assert_ne!(first, second);
        // Re-claiming never hands back an already-returned name
        let third = registry.claim("Tx2");
        assert_ne!(third, second);
    }

    #[test]
    fn test_to_type_name() {
        assert_eq!(to_type_name("account_view"), "AccountView");
        assert_eq!(to_type_name("AccountView"), "AccountView");
        assert_eq!(to_type_name("accountView"), "AccountView");
        assert_eq!(to_type_name("RpcQueryRequest"), "RpcQueryRequest");
        // Already-cased parts survive underscore joins
        assert_eq!(to_type_name("JsonRpcRequest_for_query"), "JsonRpcRequestForQuery");
    }

    #[test]
    fn test_to_member_name() {
        assert_eq!(to_member_name("block_id"), "blockId");
        assert_eq!(to_member_name("ID"), "id");
        assert_eq!(to_member_name("FunctionCall"), "functionCall");
        assert_eq!(to_member_name("num_p2p_peers"), "numP2PPeers");
    }

    #[test]
    fn test_to_case_name() {
        assert_eq!(to_case_name("not-started"), "notStarted");
        assert_eq!(to_case_name("v1.2"), "v12");
        assert_eq!(to_case_name("2fa"), "val2fa");
    }
}
