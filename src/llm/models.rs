//! Centralized model catalog
//!
//! The catalog doubles as the allow-list for model selection.

/// Model used when nothing else is configured
pub const DEFAULT_MODEL_ID: &str = "gemini-3-flash-preview";

/// Model definition with metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDef {
    /// Identifier sent to the provider (e.g., "gemini-2.5-pro")
    pub id: &'static str,
    /// Name shown in the model picker
    pub display_name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Context window size in tokens
    pub context_window: usize,
}

/// Get all available model definitions
pub fn all_models() -> &'static [ModelDef] {
    &[
        ModelDef {
            id: "gemini-3-flash-preview",
            display_name: "Gemini 3 Flash Preview",
            description: "Gemini 3 Flash preview (fast, default)",
            context_window: 1_048_576,
        },
        ModelDef {
            id: "gemini-2.5-flash",
            display_name: "Gemini 2.5 Flash",
            description: "Gemini 2.5 Flash (balanced)",
            context_window: 1_048_576,
        },
        ModelDef {
            id: "gemini-2.5-pro",
            display_name: "Gemini 2.5 Pro",
            description: "Gemini 2.5 Pro (most capable, slower)",
            context_window: 1_048_576,
        },
    ]
}

pub fn find_model(id: &str) -> Option<&'static ModelDef> {
    all_models().iter().find(|m| m.id == id)
}
