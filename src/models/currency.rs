// ============================================================================
// Module : currency
// ============================================================================
// Représente l'ensemble des devises sélectionnables
//
// CONCEPTS RUST :
// 1. Constantes : la liste de secours et la table des noms sont des données
//    pures, pas du comportement
// 2. Lifetimes élidés : currency_name(&str) -> &str emprunte son entrée
// 3. String vs &str : CurrencyList possède ses codes (String)
// ============================================================================

use serde::{Deserialize, Serialize};

/// Devise de base : la table des taux du chargement initial est exprimée
/// contre 1 USD, et l'API ne renvoie jamais la base dans ses clés
pub const BASE_CURRENCY: &str = "USD";

/// Devise cible sélectionnée par défaut
pub const DEFAULT_TARGET: &str = "EUR";

/// Liste de secours : 20 devises affichées quand l'API est injoignable
///
/// Les sélecteurs restent utilisables hors-ligne, mais la conversion reste
/// impossible sans taux (pas de cache).
pub const FALLBACK_CURRENCIES: [&str; 20] = [
    "USD", "EUR", "GBP", "JPY", "AUD", "CAD", "CHF", "CNY", "INR", "KRW",
    "MXN", "BRL", "RUB", "ZAR", "SGD", "HKD", "NOK", "SEK", "DKK", "PLN",
];

/// Retourne le nom lisible d'une devise
///
/// Table statique limitée aux 20 devises principales ; pour un code
/// inconnu on retourne le code lui-même (les sélecteurs affichent alors
/// "XDR - XDR" plutôt que rien).
pub fn currency_name(code: &str) -> &str {
    match code {
        "USD" => "US Dollar",
        "EUR" => "Euro",
        "GBP" => "British Pound",
        "JPY" => "Japanese Yen",
        "AUD" => "Australian Dollar",
        "CAD" => "Canadian Dollar",
        "CHF" => "Swiss Franc",
        "CNY" => "Chinese Yuan",
        "INR" => "Indian Rupee",
        "KRW" => "South Korean Won",
        "MXN" => "Mexican Peso",
        "BRL" => "Brazilian Real",
        "RUB" => "Russian Ruble",
        "ZAR" => "South African Rand",
        "SGD" => "Singapore Dollar",
        "HKD" => "Hong Kong Dollar",
        "NOK" => "Norwegian Krone",
        "SEK" => "Swedish Krona",
        "DKK" => "Danish Krone",
        "PLN" => "Polish Zloty",
        _ => code,
    }
}

/// Formatte le label affiché dans les sélecteurs
///
/// Format : "USD - US Dollar"
pub fn currency_label(code: &str) -> String {
    format!("{} - {}", code, currency_name(code))
}

// ============================================================================
// Structure : CurrencyList
// ============================================================================
// État d'un sélecteur de devises : les codes disponibles et l'index
// sélectionné. L'application en possède deux (source et cible).
// ============================================================================

/// Un sélecteur de devises avec sa sélection courante
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyList {
    /// Codes disponibles (ex: ["USD", "AED", "AFN", ...])
    pub codes: Vec<String>,

    /// Index du code sélectionné
    pub selected: usize,
}

impl CurrencyList {
    /// Crée un sélecteur vide (avant le premier chargement)
    pub fn empty() -> Self {
        Self {
            codes: Vec::new(),
            selected: 0,
        }
    }

    /// Construit le sélecteur depuis les codes retournés par l'API
    ///
    /// La base USD est ajoutée en tête si l'API ne la renvoie pas
    /// (la table des taux exprimée contre USD ne contient jamais USD).
    pub fn from_remote_codes(mut codes: Vec<String>) -> Self {
        if !codes.iter().any(|c| c == BASE_CURRENCY) {
            codes.insert(0, BASE_CURRENCY.to_string());
        }

        Self {
            codes,
            selected: 0,
        }
    }

    /// Construit le sélecteur depuis la liste de secours (aucun réseau)
    pub fn fallback() -> Self {
        Self {
            codes: FALLBACK_CURRENCIES.iter().map(|c| c.to_string()).collect(),
            selected: 0,
        }
    }

    /// Retourne le code sélectionné ("" si la liste est vide)
    ///
    /// CONCEPT RUST : Option -> valeur par défaut
    /// - get() retourne Option<&String>
    /// - map + unwrap_or pour retomber sur la chaîne vide
    pub fn selected_code(&self) -> &str {
        self.codes
            .get(self.selected)
            .map(|c| c.as_str())
            .unwrap_or("")
    }

    /// Sélectionne un code précis, retourne false s'il est absent
    ///
    /// Utilisé pour les sélections par défaut (USD / EUR) et pour le swap.
    pub fn select_code(&mut self, code: &str) -> bool {
        match self.codes.iter().position(|c| c == code) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }

    /// Navigue vers le haut (sans passer sous 0)
    ///
    /// CONCEPT RUST : Saturating arithmetic
    /// - saturating_sub() : soustrait mais ne descend pas en dessous de 0
    pub fn navigate_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Navigue vers le bas (sans dépasser le dernier index)
    pub fn navigate_down(&mut self) {
        let max_index = self.codes.len().saturating_sub(1);
        self.selected = (self.selected + 1).min(max_index);
    }

    /// Vérifie si le sélecteur est vide
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Nombre de devises disponibles
    pub fn len(&self) -> usize {
        self.codes.len()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_name_known() {
        assert_eq!(currency_name("USD"), "US Dollar");
        assert_eq!(currency_name("PLN"), "Polish Zloty");
    }

    #[test]
    fn test_currency_name_unknown_defaults_to_code() {
        assert_eq!(currency_name("XDR"), "XDR");
    }

    #[test]
    fn test_currency_label() {
        assert_eq!(currency_label("EUR"), "EUR - Euro");
        assert_eq!(currency_label("XDR"), "XDR - XDR");
    }

    #[test]
    fn test_fallback_list_has_20_entries() {
        let list = CurrencyList::fallback();
        assert_eq!(list.len(), 20);
        assert!(list.codes.iter().any(|c| c == "USD"));
        assert!(list.codes.iter().any(|c| c == "EUR"));
    }

    #[test]
    fn test_from_remote_codes_prepends_usd() {
        let list = CurrencyList::from_remote_codes(vec![
            "AED".to_string(),
            "EUR".to_string(),
        ]);

        assert_eq!(list.codes[0], "USD");
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_from_remote_codes_keeps_existing_usd() {
        let list = CurrencyList::from_remote_codes(vec![
            "EUR".to_string(),
            "USD".to_string(),
        ]);

        // Pas de doublon si l'API renvoie déjà USD
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_select_code() {
        let mut list = CurrencyList::fallback();

        assert!(list.select_code("EUR"));
        assert_eq!(list.selected_code(), "EUR");

        // Code absent : la sélection ne bouge pas
        assert!(!list.select_code("XXX"));
        assert_eq!(list.selected_code(), "EUR");
    }

    #[test]
    fn test_navigation_saturates() {
        let mut list = CurrencyList::from_remote_codes(vec![
            "EUR".to_string(),
            "GBP".to_string(),
        ]);
        // ["USD", "EUR", "GBP"]

        list.navigate_up();
        assert_eq!(list.selected, 0);

        list.navigate_down();
        list.navigate_down();
        assert_eq!(list.selected_code(), "GBP");

        // Au max : reste au dernier index
        list.navigate_down();
        assert_eq!(list.selected_code(), "GBP");
    }

    #[test]
    fn test_empty_list_selected_code() {
        let list = CurrencyList::empty();
        assert_eq!(list.selected_code(), "");
        assert!(list.is_empty());
    }
}
