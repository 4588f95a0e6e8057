use crate::models::Ingredient;

/// `(id, name, unit, description)` for the ingredients seeded on first run.
const DEFAULT_INGREDIENTS: [(&str, &str, &str, &str); 20] = [
    ("default-1", "大米", "克", "主食，可用于煮饭"),
    ("default-2", "面粉", "克", "主食，可用于制作面食"),
    ("default-3", "猪肉", "克", "常见肉类"),
    ("default-4", "牛肉", "克", "常见肉类"),
    ("default-5", "鸡肉", "克", "常见肉类"),
    ("default-6", "土豆", "个", "常见蔬菜"),
    ("default-7", "西红柿", "个", "常见蔬菜"),
    ("default-8", "洋葱", "个", "常见调味蔬菜"),
    ("default-9", "大蒜", "头", "常见调味料"),
    ("default-10", "姜", "块", "常见调味料"),
    ("default-11", "食用油", "毫升", "烹饪用油"),
    ("default-12", "盐", "克", "基础调味料"),
    ("default-13", "糖", "克", "基础调味料"),
    ("default-14", "酱油", "毫升", "常见调味料"),
    ("default-15", "醋", "毫升", "常见调味料"),
    ("default-16", "胡萝卜", "个", "常见蔬菜"),
    ("default-17", "青椒", "个", "常见蔬菜"),
    ("default-18", "鸡蛋", "个", "常见食材"),
    ("default-19", "豆腐", "块", "常见食材"),
    ("default-20", "葱", "根", "常见调味蔬菜"),
];

#[must_use]
pub fn default_ingredients() -> Vec<Ingredient> {
    DEFAULT_INGREDIENTS
        .iter()
        .map(|(id, name, unit, description)| Ingredient {
            id: (*id).to_string(),
            name: (*name).to_string(),
            unit: (*unit).to_string(),
            description: Some((*description).to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_twenty_defaults_with_unique_ids() {
        let defaults = default_ingredients();
        assert_eq!(defaults.len(), 20);
        let ids: HashSet<&str> = defaults.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_defaults_are_complete() {
        for ing in default_ingredients() {
            assert!(!ing.name.is_empty());
            assert!(!ing.unit.is_empty());
            assert!(ing.description.is_some());
        }
    }

    #[test]
    fn test_defaults_keep_order() {
        let defaults = default_ingredients();
        assert_eq!(defaults[0].id, "default-1");
        assert_eq!(defaults[19].id, "default-20");
    }
}
