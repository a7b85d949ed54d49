use convert_case::{Case, Casing};

const IRREGULAR: &[(&str, &str)] = &[
    ("people", "person"),
    ("children", "child"),
    ("women", "woman"),
    ("men", "man"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
];

const UNCOUNTABLE: &[&str] = &["data", "equipment", "information", "news", "series", "species"];

/// Singularize the last word of an association key.
#[must_use]
pub fn singularize(word: &str) -> String {
    let lower = word.to_lowercase();

    if UNCOUNTABLE.iter().any(|u| lower.ends_with(u)) {
        return word.to_string();
    }
    for (plural, singular) in IRREGULAR {
        if lower.ends_with(plural) {
            let stem = &word[..word.len() - plural.len()];
            return format!("{stem}{singular}");
        }
    }

    let strip = |n: usize| word[..word.len() - n].to_string();
    if lower.ends_with("ies") && word.len() > 3 {
        return format!("{}y", strip(3));
    }
    if lower.ends_with("sses")
        || lower.ends_with("xes")
        || lower.ends_with("ches")
        || lower.ends_with("shes")
        || lower.ends_with("zzes")
    {
        return strip(2);
    }
    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return word.to_string();
    }
    if lower.ends_with('s') && word.len() > 1 {
        return strip(1);
    }
    word.to_string()
}

/// Default target type for an association key: `assigns` -> `Assign`,
/// `order_items` -> `OrderItem`.
#[must_use]
pub fn type_name_for_key(key: &str) -> String {
    singularize(key).to_case(Case::Pascal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singularizes_common_plurals() {
        assert_eq!(singularize("assigns"), "assign");
        assert_eq!(singularize("companies"), "company");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("branches"), "branch");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("people"), "person");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("department"), "department");
    }

    #[test]
    fn derives_type_names_from_keys() {
        assert_eq!(type_name_for_key("department"), "Department");
        assert_eq!(type_name_for_key("tests"), "Test");
        assert_eq!(type_name_for_key("orderItems"), "OrderItem");
        assert_eq!(type_name_for_key("order_items"), "OrderItem");
    }
}
