// ============================================================================
// Module : conversion
// ============================================================================
// Représente une demande de conversion et son résultat
//
// CONCEPTS RUST :
// 1. Validation en amont : une ConversionRequest ne peut exister que valide
//    (parse() est le seul constructeur public)
// 2. thiserror : messages d'erreurs dérivés, match exhaustif côté UI
// 3. f64 : précision suffisante pour un affichage à 2 décimales
// ============================================================================

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Montant maximal accepté : 1 milliard
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

/// Erreurs de saisie utilisateur
///
/// Ces erreurs sont détectées avant tout appel réseau ; elles n'offrent
/// donc pas d'action "réessayer" (re-soumettre corrige la saisie).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Montant non numérique, non fini, ou <= 0
    #[error("Please enter a valid positive amount")]
    InvalidAmount,

    /// Montant au-dessus de la borne MAX_AMOUNT
    #[error("Amount too large. Please enter a smaller value.")]
    AmountTooLarge,

    /// Une des deux devises n'est pas sélectionnée
    #[error("Please select both currencies")]
    MissingCurrency,
}

/// Demande de conversion validée
///
/// CONCEPT RUST : Parse, don't validate
/// - parse() retourne Result<Self, ValidationError>
/// - Le reste du code manipule des demandes déjà valides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Montant à convertir (fini, > 0, <= MAX_AMOUNT)
    pub amount: f64,

    /// Devise source (ex: "USD")
    pub from: String,

    /// Devise cible (ex: "EUR")
    pub to: String,
}

impl ConversionRequest {
    /// Construit une demande depuis la saisie brute
    ///
    /// Les contrôles sont faits dans l'ordre, on s'arrête à la première
    /// erreur :
    /// 1. le montant parse en nombre fini > 0
    /// 2. le montant ne dépasse pas la borne
    /// 3. les deux devises sont renseignées
    pub fn parse(amount_input: &str, from: &str, to: &str) -> Result<Self, ValidationError> {
        let amount: f64 = amount_input
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidAmount)?;

        if !amount.is_finite() || amount <= 0.0 {
            return Err(ValidationError::InvalidAmount);
        }

        if amount > MAX_AMOUNT {
            return Err(ValidationError::AmountTooLarge);
        }

        if from.is_empty() || to.is_empty() {
            return Err(ValidationError::MissingCurrency);
        }

        Ok(Self {
            amount,
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// Vérifie si source et cible sont identiques
    ///
    /// Dans ce cas la conversion est triviale : aucun appel réseau.
    pub fn same_currency(&self) -> bool {
        self.from == self.to
    }
}

/// Arrondit au centime (2 décimales)
///
/// f64::round arrondit au plus proche, les demi-cas vers l'extérieur ;
/// suffisant pour un montant d'affichage.
fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// Structure : Conversion
// ============================================================================
// Le résultat rendu à l'utilisateur. Construit puis affiché, jamais stocké :
// chaque soumission repart d'une table de taux fraîche.
// ============================================================================

/// Résultat d'une conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    /// Montant d'origine
    pub amount: f64,

    /// Devise source
    pub from: String,

    /// Devise cible
    pub to: String,

    /// Montant converti, arrondi à 2 décimales
    pub converted: f64,

    /// Taux unitaire appliqué (None pour une conversion même devise)
    pub rate: Option<f64>,

    /// Horodatage du calcul (heure locale, comme affiché)
    pub timestamp: DateTime<Local>,
}

impl Conversion {
    /// Construit le résultat d'une conversion avec taux
    pub fn with_rate(request: ConversionRequest, rate: f64) -> Self {
        Self {
            converted: round_to_cents(request.amount * rate),
            amount: request.amount,
            from: request.from,
            to: request.to,
            rate: Some(rate),
            timestamp: Local::now(),
        }
    }

    /// Construit le résultat trivial d'une conversion même devise
    ///
    /// Le montant est repris tel quel, sans taux ni arrondi.
    pub fn identity(request: ConversionRequest) -> Self {
        Self {
            converted: request.amount,
            amount: request.amount,
            from: request.from,
            to: request.to,
            rate: None,
            timestamp: Local::now(),
        }
    }

    /// Vérifie si c'est une conversion même devise
    pub fn is_same_currency(&self) -> bool {
        self.rate.is_none()
    }

    /// Ligne principale du résultat
    ///
    /// Format : "100 USD = 92.00 EUR"
    /// Pour une conversion même devise le montant est repris brut des deux
    /// côtés : "50 EUR = 50 EUR"
    pub fn headline(&self) -> String {
        match self.rate {
            Some(_) => format!(
                "{} {} = {:.2} {}",
                self.amount, self.from, self.converted, self.to
            ),
            None => format!(
                "{} {} = {} {}",
                self.amount, self.from, self.converted, self.to
            ),
        }
    }

    /// Ligne du taux unitaire, à 4 décimales
    ///
    /// Format : "Exchange rate: 1 USD = 0.9200 EUR"
    pub fn rate_line(&self) -> Option<String> {
        self.rate.map(|rate| {
            format!("Exchange rate: 1 {} = {:.4} {}", self.from, rate, self.to)
        })
    }

    /// Ligne d'horodatage
    pub fn timestamp_line(&self) -> String {
        format!("Last updated: {}", self.timestamp.format("%H:%M:%S"))
    }

    /// Annotation affichée pour une conversion même devise
    pub fn annotation(&self) -> Option<&'static str> {
        if self.is_same_currency() {
            Some("Same currency - no conversion needed")
        } else {
            None
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_request() {
        let request = ConversionRequest::parse("100", "USD", "EUR").unwrap();

        assert_eq!(request.amount, 100.0);
        assert_eq!(request.from, "USD");
        assert_eq!(request.to, "EUR");
        assert!(!request.same_currency());
    }

    #[test]
    fn test_parse_rejects_non_numeric_amount() {
        assert_eq!(
            ConversionRequest::parse("abc", "USD", "EUR"),
            Err(ValidationError::InvalidAmount)
        );
        assert_eq!(
            ConversionRequest::parse("", "USD", "EUR"),
            Err(ValidationError::InvalidAmount)
        );
    }

    #[test]
    fn test_parse_rejects_non_positive_amount() {
        assert_eq!(
            ConversionRequest::parse("0", "USD", "EUR"),
            Err(ValidationError::InvalidAmount)
        );
        assert_eq!(
            ConversionRequest::parse("-5", "USD", "EUR"),
            Err(ValidationError::InvalidAmount)
        );
        // "NaN" parse en f64::NAN : non fini, donc rejeté
        assert_eq!(
            ConversionRequest::parse("NaN", "USD", "EUR"),
            Err(ValidationError::InvalidAmount)
        );
    }

    #[test]
    fn test_parse_rejects_amount_above_bound() {
        assert_eq!(
            ConversionRequest::parse("1000000001", "USD", "EUR"),
            Err(ValidationError::AmountTooLarge)
        );

        // La borne elle-même est acceptée
        assert!(ConversionRequest::parse("1000000000", "USD", "EUR").is_ok());
    }

    #[test]
    fn test_parse_rejects_missing_currency() {
        assert_eq!(
            ConversionRequest::parse("10", "", "EUR"),
            Err(ValidationError::MissingCurrency)
        );
        assert_eq!(
            ConversionRequest::parse("10", "USD", ""),
            Err(ValidationError::MissingCurrency)
        );
    }

    #[test]
    fn test_parse_checks_amount_before_currencies() {
        // Montant invalide ET devises vides : le montant gagne
        assert_eq!(
            ConversionRequest::parse("abc", "", ""),
            Err(ValidationError::InvalidAmount)
        );
    }

    #[test]
    fn test_conversion_with_rate() {
        let request = ConversionRequest::parse("100", "USD", "EUR").unwrap();
        let conversion = Conversion::with_rate(request, 0.92);

        assert_eq!(conversion.converted, 92.0);
        assert_eq!(conversion.headline(), "100 USD = 92.00 EUR");
        assert_eq!(
            conversion.rate_line().unwrap(),
            "Exchange rate: 1 USD = 0.9200 EUR"
        );
        assert!(conversion.annotation().is_none());
    }

    #[test]
    fn test_conversion_rounds_to_two_decimals() {
        let request = ConversionRequest::parse("3", "USD", "EUR").unwrap();
        let conversion = Conversion::with_rate(request, 0.333333);

        assert_eq!(conversion.converted, 1.0);
        assert_eq!(conversion.headline(), "3 USD = 1.00 EUR");
    }

    #[test]
    fn test_conversion_identity() {
        let request = ConversionRequest::parse("50", "EUR", "EUR").unwrap();
        assert!(request.same_currency());

        let conversion = Conversion::identity(request);

        assert_eq!(conversion.converted, 50.0);
        assert_eq!(conversion.headline(), "50 EUR = 50 EUR");
        assert!(conversion.rate_line().is_none());
        assert_eq!(
            conversion.annotation(),
            Some("Same currency - no conversion needed")
        );
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::InvalidAmount.to_string(),
            "Please enter a valid positive amount"
        );
        assert_eq!(
            ValidationError::AmountTooLarge.to_string(),
            "Amount too large. Please enter a smaller value."
        );
        assert_eq!(
            ValidationError::MissingCurrency.to_string(),
            "Please select both currencies"
        );
    }
}
