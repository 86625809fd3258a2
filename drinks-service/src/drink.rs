use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Public view: colors and proportions only, no ingredient names.
#[derive(Debug, Serialize)]
pub struct DrinkShort<'a> {
    pub id: i64,
    pub title: &'a str,
    pub recipe: Vec<ShortIngredient<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ShortIngredient<'a> {
    pub color: &'a str,
    pub parts: u32,
}

#[derive(Debug, Serialize)]
pub struct DrinkLong<'a> {
    pub id: i64,
    pub title: &'a str,
    pub recipe: &'a [Ingredient],
}

impl Drink {
    pub fn short(&self) -> DrinkShort<'_> {
        DrinkShort {
            id: self.id,
            title: &self.title,
            recipe: self
                .recipe
                .iter()
                .map(|i| ShortIngredient { color: &i.color, parts: i.parts })
                .collect(),
        }
    }

    pub fn long(&self) -> DrinkLong<'_> {
        DrinkLong {
            id: self.id,
            title: &self.title,
            recipe: &self.recipe,
        }
    }
}

/// Clients send either one ingredient object or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeInput {
    Many(Vec<Ingredient>),
    One(Ingredient),
}

impl RecipeInput {
    pub fn into_vec(self) -> Vec<Ingredient> {
        match self {
            RecipeInput::Many(items) => items,
            RecipeInput::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewDrink {
    pub title: String,
    pub recipe: RecipeInput,
}

#[derive(Debug, Default, Deserialize)]
pub struct DrinkPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub recipe: Option<RecipeInput>,
}

pub fn validate_title(title: &str) -> Result<String, &'static str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err("title must not be empty");
    }
    Ok(trimmed.to_string())
}

pub fn validate_recipe(recipe: RecipeInput) -> Result<Vec<Ingredient>, &'static str> {
    let items = recipe.into_vec();
    if items.is_empty() {
        return Err("recipe must contain at least one ingredient");
    }
    if items.iter().any(|i| i.parts == 0) {
        return Err("ingredient parts must be positive");
    }
    if items.iter().any(|i| i.name.trim().is_empty() || i.color.trim().is_empty()) {
        return Err("ingredient name and color must not be empty");
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mojito() -> Drink {
        Drink {
            id: 3,
            title: "mojito".into(),
            recipe: vec![
                Ingredient { name: "rum".into(), color: "white".into(), parts: 2 },
                Ingredient { name: "mint".into(), color: "green".into(), parts: 1 },
            ],
        }
    }

    #[test]
    fn short_drops_ingredient_names() {
        let value = serde_json::to_value(mojito().short()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 3,
                "title": "mojito",
                "recipe": [{ "color": "white", "parts": 2 }, { "color": "green", "parts": 1 }]
            })
        );
    }

    #[test]
    fn long_keeps_full_recipe() {
        let value = serde_json::to_value(mojito().long()).unwrap();
        assert_eq!(value["recipe"][1]["name"], "mint");
    }

    #[test]
    fn recipe_accepts_single_object_or_list() {
        let one: NewDrink = serde_json::from_value(json!({
            "title": "water",
            "recipe": { "name": "water", "color": "blue", "parts": 1 }
        }))
        .unwrap();
        assert_eq!(one.recipe.into_vec().len(), 1);

        let many: NewDrink = serde_json::from_value(json!({
            "title": "latte",
            "recipe": [
                { "name": "espresso", "color": "brown", "parts": 1 },
                { "name": "milk", "color": "white", "parts": 3 }
            ]
        }))
        .unwrap();
        assert_eq!(many.recipe.into_vec().len(), 2);
    }

    #[test]
    fn validation_rejects_empty_parts() {
        assert!(validate_title("   ").is_err());
        assert_eq!(validate_title("  flat white ").unwrap(), "flat white");
        assert!(validate_recipe(RecipeInput::Many(vec![])).is_err());
        assert!(validate_recipe(RecipeInput::One(Ingredient {
            name: "ice".into(),
            color: "clear".into(),
            parts: 0,
        }))
        .is_err());
    }
}
