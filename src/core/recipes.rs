use crate::domain::model::{AllergenTag, AllergyProfile};
use crate::utils::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub title: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    #[serde(default)]
    pub allergens: Vec<AllergenTag>,
}

impl Recipe {
    pub fn is_safe_for(&self, profile: &AllergyProfile) -> bool {
        self.allergens.iter().all(|tag| !profile.is_active(*tag))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeBook {
    #[serde(rename = "recipe", default)]
    pub recipes: Vec<Recipe>,
}

fn recipe(
    title: &str,
    ingredients: &[&str],
    instructions: &str,
    allergens: &[AllergenTag],
) -> Recipe {
    Recipe {
        title: title.to_string(),
        ingredients: ingredients.iter().map(|i| i.to_string()).collect(),
        instructions: instructions.to_string(),
        allergens: allergens.to_vec(),
    }
}

impl RecipeBook {
    pub fn builtin() -> Self {
        Self {
            recipes: vec![
                recipe(
                    "Vegan Pancakes",
                    &["Flour", "Soy milk", "Baking powder", "Maple syrup"],
                    "Mix all ingredients and cook on a hot griddle.",
                    &[AllergenTag::Gluten, AllergenTag::Soy],
                ),
                recipe(
                    "Gluten-Free Pasta",
                    &["Gluten-free pasta", "Tomato sauce", "Basil"],
                    "Cook pasta, add sauce, and garnish with basil.",
                    &[],
                ),
                recipe(
                    "Egg-Free Brownies",
                    &["Flour", "Cocoa powder", "Sugar", "Vegetable oil"],
                    "Mix all ingredients, bake at 180°C for 25 minutes.",
                    &[AllergenTag::Gluten],
                ),
            ],
        }
    }

    /// Parses `[[recipe]]` tables.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ScanError::ConfigValidationError {
            field: "recipes".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Recipes declaring none of the profile's active allergens.
    pub fn safe_for(&self, profile: &AllergyProfile) -> Vec<&Recipe> {
        self.recipes
            .iter()
            .filter(|recipe| recipe.is_safe_for(profile))
            .collect()
    }
}
