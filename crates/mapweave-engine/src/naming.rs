//! Naming helpers for generated methods.
//!
//! | Input | Function | Output |
//! |-------|----------|--------|
//! | `PascalCase` | [`to_snake_case`] | `pascal_case` |
//! | `Address`, `AddressDto` | [`helper_method_name`] | `map_address_to_address_dto` |

use std::collections::BTreeSet;

/// Convert PascalCase or camelCase to snake_case.
///
/// Runs of capitals are kept together (`HTTPServer` becomes `http_server`).
///
/// # Examples
///
/// ```
/// use mapweave_engine::naming::to_snake_case;
///
/// assert_eq!(to_snake_case("AddressDto"), "address_dto");
/// assert_eq!(to_snake_case("userId"), "user_id");
/// assert_eq!(to_snake_case("already_snake"), "already_snake");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                None | Some('_') => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                Some(_) => false,
            };
            if boundary {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

/// Name of the generated helper mapping `source` into `target`.
pub fn helper_method_name(source: &str, target: &str) -> String {
    format!("map_{}_to_{}", to_snake_case(source), to_snake_case(target))
}

/// Return `base`, or `base_2`, `base_3`, ... whichever is not yet taken,
/// and mark it taken.
pub fn claim_unique(base: &str, taken: &mut BTreeSet<String>) -> String {
    if taken.insert(base.to_string()) {
        return base.to_string();
    }

    let mut suffix = 2usize;
    loop {
        let candidate = format!("{base}_{suffix}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn to_snake_case___converts_pascal_case() {
        assert_eq!(to_snake_case("AddressDto"), "address_dto");
        assert_eq!(to_snake_case("User"), "user");
        assert_eq!(to_snake_case("OrderLineItem"), "order_line_item");
    }

    #[test]
    fn to_snake_case___keeps_acronyms_together() {
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("UserID"), "user_id");
    }

    #[test]
    fn to_snake_case___handles_camel_case_and_digits() {
        assert_eq!(to_snake_case("userId"), "user_id");
        assert_eq!(to_snake_case("Vector3D"), "vector3_d");
        assert_eq!(to_snake_case(""), "");
    }

    #[test]
    fn to_snake_case___leaves_snake_case_alone() {
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("Mixed_Case"), "mixed_case");
    }

    #[test]
    fn helper_method_name___joins_snake_case_types() {
        assert_eq!(
            helper_method_name("Address", "AddressDto"),
            "map_address_to_address_dto"
        );
    }

    #[test]
    fn claim_unique___appends_increasing_suffix() {
        let mut taken = BTreeSet::new();

        assert_eq!(claim_unique("map_a_to_b", &mut taken), "map_a_to_b");
        assert_eq!(claim_unique("map_a_to_b", &mut taken), "map_a_to_b_2");
        assert_eq!(claim_unique("map_a_to_b", &mut taken), "map_a_to_b_3");
    }

    #[test]
    fn claim_unique___skips_preexisting_names() {
        let mut taken: BTreeSet<String> = ["map".to_string(), "map_2".to_string()].into();

        assert_eq!(claim_unique("map", &mut taken), "map_3");
    }
}
