// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Enums pour state machines : un résultat est Idle, Loading, Success
//    ou Error, jamais deux à la fois
//
// PATTERN : Cette structure suit le pattern "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - Garantit la cohérence de l'état
// ============================================================================

use crate::api::FetchError;
use crate::models::{
    Conversion, ConversionRequest, CurrencyList, ValidationError, BASE_CURRENCY, DEFAULT_TARGET,
};

// ============================================================================
// Enum : Focus
// ============================================================================
// CONCEPT RUST : Enums pour state machines
// - Un seul widget a le focus à la fois
// - Tab fait tourner le focus : Montant -> Source -> Cible -> Montant
// ============================================================================

/// Widget ayant le focus clavier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Ligne de saisie du montant
    Amount,

    /// Sélecteur de la devise source
    From,

    /// Sélecteur de la devise cible
    To,
}

impl Focus {
    /// Widget suivant dans le cycle (touche Tab)
    pub fn next(self) -> Self {
        match self {
            Focus::Amount => Focus::From,
            Focus::From => Focus::To,
            Focus::To => Focus::Amount,
        }
    }

    /// Widget précédent dans le cycle (touche Shift+Tab)
    pub fn previous(self) -> Self {
        match self {
            Focus::Amount => Focus::To,
            Focus::From => Focus::Amount,
            Focus::To => Focus::From,
        }
    }
}

/// Opération réseau ré-exécutable depuis le panneau d'erreur
///
/// CONCEPT : Retry avec les mêmes entrées
/// - L'opération échouée est conservée telle quelle dans l'état d'erreur
/// - [r] la renvoie au worker sans la reconstruire
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Chargement de la liste des devises (base USD)
    LoadCurrencies,

    /// Conversion d'une demande validée
    Convert(ConversionRequest),
}

// ============================================================================
// Enum : ResultState
// ============================================================================
// State machine du panneau de résultat : idle -> loading -> success | error.
// Depuis error, seul un retry explicite de l'utilisateur relance un loading.
// Pas de retry automatique, pas de backoff, pas de limite.
// ============================================================================

/// État du panneau de résultat
#[derive(Debug, Clone, PartialEq)]
pub enum ResultState {
    /// Rien à afficher (invite à saisir)
    Idle,

    /// Une opération est en cours
    Loading {
        /// Message affiché pendant le chargement
        message: String,
    },

    /// Conversion terminée
    Success(Conversion),

    /// Échec affiché à l'utilisateur
    Error {
        /// Message complet (préfixe de catégorie inclus)
        message: String,

        /// Opération à relancer avec [r] (None pour une erreur de saisie :
        /// corriger la saisie et re-soumettre suffit)
        retry: Option<Operation>,
    },
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Widget ayant le focus
    pub focus: Focus,

    /// Sélecteur de la devise source
    pub from_list: CurrencyList,

    /// Sélecteur de la devise cible
    pub to_list: CurrencyList,

    /// Buffer de saisie du montant
    pub amount_input: String,

    /// Panneau de résultat (state machine)
    pub result: ResultState,

    /// Compteur de génération des opérations réseau
    ///
    /// CONCEPT : Last request wins
    /// - Chaque opération émise porte un numéro de séquence
    /// - Un résultat qui revient avec un numéro périmé est ignoré :
    ///   la réponse tardive d'une demande remplacée ne peut pas écraser
    ///   un résultat plus récent
    request_seq: u64,

    /// Indique si l'utilisateur a demandé à quitter (attend confirmation)
    /// CONCEPT : Two-step quit pour éviter les sorties accidentelles
    pub confirm_quit: bool,
}

impl App {
    /// Crée une nouvelle instance avec des sélecteurs vides
    ///
    /// Les sélecteurs sont remplis par le premier chargement (ou par la
    /// liste de secours si ce chargement échoue).
    pub fn new() -> Self {
        Self {
            running: true,
            focus: Focus::Amount,
            from_list: CurrencyList::empty(),
            to_list: CurrencyList::empty(),
            amount_input: String::new(),
            result: ResultState::Idle,
            request_seq: 0,
            confirm_quit: false,
        }
    }

    /// Quitte l'application
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Vérifie si l'application doit continuer
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Demande la confirmation de quitter
    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    /// Annule la demande de quit
    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    /// Vérifie si on attend la confirmation de quit
    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    /// Tick : appelé à chaque itération de la boucle
    ///
    /// Rien à mettre à jour hors événement pour l'instant
    pub fn tick(&mut self) {}

    // ========================================================================
    // Focus et navigation
    // ========================================================================

    /// Passe le focus au widget suivant
    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    /// Passe le focus au widget précédent
    pub fn focus_previous(&mut self) {
        self.focus = self.focus.previous();
    }

    /// Navigue vers le haut dans le sélecteur qui a le focus
    pub fn navigate_up(&mut self) {
        match self.focus {
            Focus::From => self.from_list.navigate_up(),
            Focus::To => self.to_list.navigate_up(),
            Focus::Amount => {}
        }
    }

    /// Navigue vers le bas dans le sélecteur qui a le focus
    pub fn navigate_down(&mut self) {
        match self.focus {
            Focus::From => self.from_list.navigate_down(),
            Focus::To => self.to_list.navigate_down(),
            Focus::Amount => {}
        }
    }

    // ========================================================================
    // Saisie du montant
    // ========================================================================

    /// Ajoute un caractère au buffer du montant
    pub fn append_char(&mut self, c: char) {
        self.amount_input.push(c);
    }

    /// Supprime le dernier caractère du buffer
    pub fn backspace(&mut self) {
        self.amount_input.pop();
    }

    /// Vérifie si le montant saisi est convertible (fini et > 0)
    ///
    /// Utilisé par le swap pour relancer automatiquement la conversion :
    /// une saisie vide ou invalide ne déclenche rien.
    pub fn has_convertible_amount(&self) -> bool {
        self.amount_input
            .trim()
            .parse::<f64>()
            .map(|amount| amount.is_finite() && amount > 0.0)
            .unwrap_or(false)
    }

    // ========================================================================
    // Sélecteurs de devises
    // ========================================================================

    /// Remplit les deux sélecteurs depuis les codes retournés par l'API
    ///
    /// Sélections par défaut : USD en source, EUR en cible (quand présents).
    pub fn set_currencies(&mut self, codes: Vec<String>) {
        self.from_list = CurrencyList::from_remote_codes(codes.clone());
        self.to_list = CurrencyList::from_remote_codes(codes);
        self.apply_default_selections();
        self.result = ResultState::Idle;
    }

    /// Remplit les deux sélecteurs depuis la liste de secours
    ///
    /// Remplacement inconditionnel : on ne cherche pas à préserver un
    /// contenu partiel. Le panneau d'erreur du chargement reste affiché,
    /// lui, jusqu'au prochain changement d'état.
    pub fn apply_fallback_currencies(&mut self) {
        self.from_list = CurrencyList::fallback();
        self.to_list = CurrencyList::fallback();
        self.apply_default_selections();
    }

    /// Sélectionne USD en source et EUR en cible quand présents
    fn apply_default_selections(&mut self) {
        self.from_list.select_code(BASE_CURRENCY);
        self.to_list.select_code(DEFAULT_TARGET);
    }

    /// Échange les devises source et cible
    pub fn swap_currencies(&mut self) {
        let from = self.from_list.selected_code().to_string();
        let to = self.to_list.selected_code().to_string();

        self.from_list.select_code(&to);
        self.to_list.select_code(&from);
    }

    // ========================================================================
    // Construction d'une demande
    // ========================================================================

    /// Construit une demande de conversion depuis l'état des widgets
    ///
    /// Les contrôles de saisie sont faits ici, avant tout appel réseau.
    pub fn build_request(&self) -> Result<ConversionRequest, ValidationError> {
        ConversionRequest::parse(
            &self.amount_input,
            self.from_list.selected_code(),
            self.to_list.selected_code(),
        )
    }

    // ========================================================================
    // State machine du résultat
    // ========================================================================

    /// Démarre une opération réseau : nouvelle génération + état loading
    ///
    /// Retourne le numéro de séquence à attacher à la commande envoyée au
    /// worker ; le résultat devra le présenter pour être accepté.
    pub fn begin_operation(&mut self, message: String) -> u64 {
        self.request_seq += 1;
        self.result = ResultState::Loading { message };
        self.request_seq
    }

    /// Vérifie qu'un numéro de séquence est celui de la dernière opération
    ///
    /// Un résultat périmé (demande remplacée entre-temps) doit être ignoré.
    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.request_seq
    }

    /// Affiche un résultat de conversion
    pub fn set_success(&mut self, conversion: Conversion) {
        self.result = ResultState::Success(conversion);
    }

    /// Affiche une erreur de saisie (aucun appel réseau n'a eu lieu)
    pub fn set_validation_error(&mut self, error: &ValidationError) {
        self.result = ResultState::Error {
            message: error.to_string(),
            retry: None,
        };
    }

    /// Affiche l'échec du chargement des devises, avec retry
    pub fn set_load_error(&mut self, error: &FetchError) {
        self.result = ResultState::Error {
            message: format!(
                "Error loading currencies. {}Please check your internet connection and try again.",
                error.user_prefix()
            ),
            retry: Some(Operation::LoadCurrencies),
        };
    }

    /// Affiche l'échec d'une conversion, avec retry de la même demande
    pub fn set_conversion_error(&mut self, request: ConversionRequest, error: &FetchError) {
        self.result = ResultState::Error {
            message: format!(
                "Error converting currency. {}Please try again.",
                error.user_prefix()
            ),
            retry: Some(Operation::Convert(request)),
        };
    }

    /// Retourne l'opération à relancer si le panneau d'erreur en offre une
    pub fn retry_operation(&self) -> Option<Operation> {
        match &self.result {
            ResultState::Error { retry, .. } => retry.clone(),
            _ => None,
        }
    }

    /// Vérifie si une opération est en cours
    pub fn is_loading(&self) -> bool {
        matches!(self.result, ResultState::Loading { .. })
    }
}

// ============================================================================
// Trait Default
// ============================================================================
// Convention Rust : si new() ne prend pas de paramètres, implémenter Default
// ============================================================================

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_creation() {
        let app = App::new();

        assert!(app.is_running());
        assert_eq!(app.focus, Focus::Amount);
        assert!(app.from_list.is_empty());
        assert!(app.to_list.is_empty());
        assert_eq!(app.result, ResultState::Idle);
    }

    #[test]
    fn test_app_quit() {
        let mut app = App::new();
        assert!(app.is_running());

        app.quit();
        assert!(!app.is_running());
    }

    #[test]
    fn test_focus_cycles() {
        let mut app = App::new();

        app.focus_next();
        assert_eq!(app.focus, Focus::From);
        app.focus_next();
        assert_eq!(app.focus, Focus::To);
        app.focus_next();
        assert_eq!(app.focus, Focus::Amount);

        app.focus_previous();
        assert_eq!(app.focus, Focus::To);
    }

    #[test]
    fn test_set_currencies_applies_defaults() {
        let mut app = App::new();

        app.set_currencies(vec![
            "AED".to_string(),
            "EUR".to_string(),
            "GBP".to_string(),
        ]);

        // USD ajouté en tête, sélectionné en source ; EUR en cible
        assert_eq!(app.from_list.selected_code(), "USD");
        assert_eq!(app.to_list.selected_code(), "EUR");
        assert_eq!(app.result, ResultState::Idle);
    }

    #[test]
    fn test_fallback_populates_both_selectors() {
        let mut app = App::new();

        app.apply_fallback_currencies();

        assert_eq!(app.from_list.len(), 20);
        assert_eq!(app.to_list.len(), 20);
        assert_eq!(app.from_list.selected_code(), "USD");
        assert_eq!(app.to_list.selected_code(), "EUR");
    }

    #[test]
    fn test_swap_currencies() {
        let mut app = App::new();
        app.apply_fallback_currencies();

        app.swap_currencies();

        assert_eq!(app.from_list.selected_code(), "EUR");
        assert_eq!(app.to_list.selected_code(), "USD");
    }

    #[test]
    fn test_has_convertible_amount() {
        let mut app = App::new();
        assert!(!app.has_convertible_amount());

        app.amount_input = "abc".to_string();
        assert!(!app.has_convertible_amount());

        app.amount_input = "0".to_string();
        assert!(!app.has_convertible_amount());

        app.amount_input = "100.5".to_string();
        assert!(app.has_convertible_amount());
    }

    #[test]
    fn test_build_request_validates_input() {
        let mut app = App::new();
        app.apply_fallback_currencies();

        // Montant invalide en premier
        app.amount_input = "abc".to_string();
        assert_eq!(app.build_request(), Err(ValidationError::InvalidAmount));

        // Sélecteurs vides : devises manquantes
        let mut empty = App::new();
        empty.amount_input = "10".to_string();
        assert_eq!(empty.build_request(), Err(ValidationError::MissingCurrency));

        // Demande valide
        app.amount_input = "10".to_string();
        let request = app.build_request().unwrap();
        assert_eq!(request.from, "USD");
        assert_eq!(request.to, "EUR");
    }

    #[test]
    fn test_stale_result_is_not_current() {
        let mut app = App::new();

        let first = app.begin_operation("Converting...".to_string());
        let second = app.begin_operation("Converting...".to_string());

        // La réponse tardive de la première demande doit être ignorée
        assert!(!app.is_current(first));
        assert!(app.is_current(second));
        assert!(app.is_loading());
    }

    #[test]
    fn test_validation_error_has_no_retry() {
        let mut app = App::new();

        app.set_validation_error(&ValidationError::InvalidAmount);

        assert!(app.retry_operation().is_none());
        assert!(matches!(app.result, ResultState::Error { .. }));
    }

    #[test]
    fn test_load_error_offers_retry_with_category_prefix() {
        let mut app = App::new();

        app.set_load_error(&FetchError::Timeout);

        match &app.result {
            ResultState::Error { message, retry } => {
                assert!(message.contains("Request timed out."));
                assert_eq!(retry, &Some(Operation::LoadCurrencies));
            }
            other => panic!("état inattendu : {:?}", other),
        }
    }

    #[test]
    fn test_load_failure_keeps_selectors_usable() {
        let mut app = App::new();

        // Échec du chargement : erreur affichée ET liste de secours appliquée
        app.set_load_error(&FetchError::Timeout);
        app.apply_fallback_currencies();

        assert_eq!(app.from_list.len(), 20);
        assert_eq!(app.to_list.len(), 20);
        assert_eq!(app.from_list.selected_code(), "USD");
        assert_eq!(app.to_list.selected_code(), "EUR");

        // Le panneau d'erreur reste affiché avec son retry
        assert_eq!(app.retry_operation(), Some(Operation::LoadCurrencies));
    }

    #[test]
    fn test_conversion_error_retries_same_request() {
        let mut app = App::new();
        let request = ConversionRequest::parse("100", "USD", "EUR").unwrap();

        app.set_conversion_error(request.clone(), &FetchError::Status(500));

        match app.retry_operation() {
            Some(Operation::Convert(retried)) => assert_eq!(retried, request),
            other => panic!("retry inattendu : {:?}", other),
        }
    }

    #[test]
    fn test_two_step_quit() {
        let mut app = App::new();

        app.request_quit();
        assert!(app.is_awaiting_quit_confirmation());

        app.cancel_quit();
        assert!(!app.is_awaiting_quit_confirmation());
    }
}
