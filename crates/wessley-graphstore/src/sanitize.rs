/// Strips every character outside `[A-Za-z0-9_]` from a relationship-type
/// name before it is interpolated into a Cypher query (§4.7).
pub fn sanitize_rel_type(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if cleaned.is_empty() {
        "RELATED_TO".to_string()
    } else {
        cleaned.to_ascii_uppercase()
    }
}

/// Strips every character outside `[A-Za-z0-9_]` from a component property
/// key before it is interpolated into a Cypher `SET` clause (§4.7): Cypher
/// has no way to parameterise a property key, so the key itself, not just
/// its value, has to be sanitised and formatted into the query text.
pub fn sanitize_prop_key(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if cleaned.is_empty() {
        "prop".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_non_alphanumeric_underscore_characters() {
        assert_eq!(sanitize_rel_type("has-fault; DROP TABLE"), "HASFAULTDROPTABLE");
    }

    #[test]
    fn keeps_underscores_and_digits() {
        assert_eq!(sanitize_rel_type("part_of_v2"), "PART_OF_V2");
    }

    #[test]
    fn empty_after_stripping_falls_back_to_related_to() {
        assert_eq!(sanitize_rel_type("!!!"), "RELATED_TO");
    }

    #[test]
    fn prop_key_strips_non_alphanumeric_underscore_characters() {
        assert_eq!(sanitize_prop_key("torque spec; DROP TABLE"), "torquespecDROPTABLE");
    }

    #[test]
    fn prop_key_empty_after_stripping_falls_back_to_prop() {
        assert_eq!(sanitize_prop_key("!!!"), "prop");
    }
}
