// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod events;    // Gestion des événements clavier
pub mod converter; // Rendu de l'interface de conversion

// Re-exports pour simplifier les imports
pub use events::{Event, EventHandler};
pub use converter::render;
