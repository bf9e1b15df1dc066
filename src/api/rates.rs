// ============================================================================
// API Client : taux de change
// ============================================================================
// Récupère les tables de taux depuis l'API publique exchangerate-api.com
//
// CONCEPTS RUST AVANCÉS :
// 1. async/await : programmation asynchrone (non-bloquante)
// 2. thiserror : classification typée des échecs (timeout, HTTP, réseau...)
// 3. Serde : désérialisation JSON automatique
// 4. Duration : délais d'expiration par requête
// ============================================================================

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::models::BASE_CURRENCY;

const API_BASE_URL: &str = "https://api.exchangerate-api.com/v4/latest";

/// Délai maximal du chargement initial de la liste des devises
pub const CURRENCY_LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// Délai maximal d'un appel de conversion
pub const CONVERSION_TIMEOUT: Duration = Duration::from_secs(8);

// ============================================================================
// Enum : FetchError
// ============================================================================
// Chaque échec réseau tombe dans une catégorie précise ; l'interface affiche
// un préfixe distinct par catégorie mais offre la même action de retry pour
// toutes. La priorité de classification : timeout > statut HTTP > réseau >
// générique.
// ============================================================================

/// Échecs d'un appel à l'API de taux de change
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// La requête a été interrompue par son délai d'expiration
    #[error("la requête a dépassé le délai imparti")]
    Timeout,

    /// Le serveur a répondu avec un statut non-succès
    #[error("le serveur a retourné une erreur : HTTP {0}")]
    Status(u16),

    /// Échec de connexion (DNS, connexion refusée, coupure...)
    #[error("erreur de connexion réseau : {0}")]
    Network(String),

    /// Le corps de la réponse n'a pas la structure attendue
    /// (champ "rates" absent ou qui n'est pas un objet)
    #[error("réponse de l'API invalide : {0}")]
    Malformed(String),

    /// La table des taux ne contient pas la devise cible
    #[error("taux de change introuvable pour {0}")]
    MissingRate(String),

    /// Le taux retourné n'est pas un nombre fini > 0
    #[error("taux de change invalide pour {0}")]
    InvalidRate(String),

    /// Tout le reste
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Préfixe du message utilisateur selon la catégorie
    ///
    /// Quatre catégories visibles : timeout, serveur, réseau, générique
    /// (préfixe vide). Purement présentationnel : le retry est identique
    /// pour toutes.
    pub fn user_prefix(&self) -> &'static str {
        match self {
            FetchError::Timeout => "Request timed out. ",
            FetchError::Status(_) => "Server error. ",
            FetchError::Network(_) => "Network connection error. ",
            _ => "",
        }
    }
}

/// Classifie une erreur reqwest dans notre taxonomie
///
/// CONCEPT RUST : reqwest::Error est opaque, on l'interroge via ses
/// prédicats (is_timeout, status, is_connect) dans l'ordre de priorité.
fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = err.status() {
        FetchError::Status(status.as_u16())
    } else if err.is_connect() {
        FetchError::Network(err.to_string())
    } else {
        FetchError::Other(err.to_string())
    }
}

// ============================================================================
// Structures pour parser la réponse JSON de l'API
// ============================================================================
// L'API retourne { "base": "USD", "date": "...", "rates": { "EUR": 0.92, ... } }
// Seul le champ "rates" nous intéresse : les autres sont ignorés par serde.
// Un champ "rates" absent ou non-objet fait échouer la désérialisation,
// ce qui est exactement notre définition d'une réponse malformée.
// ============================================================================

/// Réponse de l'API de taux de change
#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

// ============================================================================
// Fonctions publiques de l'API
// ============================================================================

/// Construit l'URL de l'API pour une devise de base
///
/// CONCEPT RUST : &str vs String
/// - Fonction prend &str (référence, pas d'allocation)
/// - Retourne String (owned, allouée)
fn build_rates_url(base: &str) -> String {
    format!("{}/{}", API_BASE_URL, base)
}

/// Récupère la table des taux pour une devise de base
///
/// La table retournée vaut pour la durée d'une seule demande : elle n'est
/// jamais mise en cache. Le délai d'expiration est porté par la requête
/// elle-même ; son dépassement annule l'appel et est classé Timeout.
///
/// # Arguments
/// * `base` - Devise de base (ex: "USD")
/// * `timeout` - Délai maximal de l'appel complet
#[instrument(skip(timeout))]
pub async fn fetch_rate_table(
    base: &str,
    timeout: Duration,
) -> Result<HashMap<String, f64>, FetchError> {
    let url = build_rates_url(base);
    debug!(url = %url, "Built exchange-rate API URL");

    let client = reqwest::Client::builder()
        .user_agent("cambio/0.1")
        .build()
        .map_err(|e| FetchError::Other(e.to_string()))?;

    debug!("Sending HTTP request to exchange-rate API");
    let response = client
        .get(&url)
        .timeout(timeout)
        .send()
        .await
        .map_err(classify)?;

    let status = response.status();
    debug!(status = %status, "Received HTTP response");

    if !status.is_success() {
        error!(status = %status, "Exchange-rate API returned error status");
        return Err(FetchError::Status(status.as_u16()));
    }

    // Le corps est lu en texte puis parsé à part : une coupure en cours de
    // lecture reste classée transport, un JSON inattendu réponse malformée
    let body = response.text().await.map_err(classify)?;
    let rates = parse_rates_body(&body)?;

    info!(base = %base, rates = rates.len(), "Successfully fetched rate table");
    Ok(rates)
}

/// Parse le corps de la réponse et en extrait la table des taux
fn parse_rates_body(body: &str) -> Result<HashMap<String, f64>, FetchError> {
    let parsed: RatesResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;
    Ok(parsed.rates)
}

/// Récupère l'ensemble des codes de devises disponibles
///
/// Le jeu de codes est dérivé des clés de la table des taux en base USD.
/// Les clés d'un objet JSON passées par une HashMap n'ont pas d'ordre :
/// on trie alphabétiquement pour un sélecteur stable.
#[instrument]
pub async fn fetch_currency_codes() -> Result<Vec<String>, FetchError> {
    let rates = fetch_rate_table(BASE_CURRENCY, CURRENCY_LIST_TIMEOUT).await?;

    let mut codes: Vec<String> = rates.into_keys().collect();
    codes.sort();

    info!(codes = codes.len(), "Currency code set derived from rate table");
    Ok(codes)
}

/// Récupère le taux unitaire source -> cible
///
/// La table est demandée avec la devise *source* comme base, le taux de la
/// cible y est lu directement : pas de triangulation.
#[instrument]
pub async fn fetch_conversion_rate(from: &str, to: &str) -> Result<f64, FetchError> {
    let rates = fetch_rate_table(from, CONVERSION_TIMEOUT).await?;
    extract_rate(&rates, to)
}

/// Extrait et valide le taux de la devise cible
fn extract_rate(rates: &HashMap<String, f64>, to: &str) -> Result<f64, FetchError> {
    let rate = *rates
        .get(to)
        .ok_or_else(|| FetchError::MissingRate(to.to_string()))?;

    if !rate.is_finite() || rate <= 0.0 {
        return Err(FetchError::InvalidRate(to.to_string()));
    }

    Ok(rate)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_rates_url() {
        let url = build_rates_url("USD");
        assert!(url.contains("exchangerate-api.com"));
        assert!(url.ends_with("/latest/USD"));
    }

    #[test]
    fn test_parse_rates_body_valid() {
        let body = r#"{"base":"USD","date":"2024-01-15","rates":{"EUR":0.92,"GBP":0.79}}"#;
        let rates = parse_rates_body(body).unwrap();

        assert_eq!(rates.len(), 2);
        assert_eq!(rates.get("EUR"), Some(&0.92));
    }

    #[test]
    fn test_parse_rates_body_missing_rates_field() {
        let body = r#"{"base":"USD","date":"2024-01-15"}"#;
        let result = parse_rates_body(body);

        assert!(matches!(result, Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_parse_rates_body_rates_not_an_object() {
        let body = r#"{"rates":"indisponible"}"#;
        assert!(matches!(parse_rates_body(body), Err(FetchError::Malformed(_))));

        let body = r#"pas du json"#;
        assert!(matches!(parse_rates_body(body), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_extract_rate() {
        let mut rates = HashMap::new();
        rates.insert("EUR".to_string(), 0.92);
        rates.insert("XXX".to_string(), 0.0);
        rates.insert("YYY".to_string(), -1.5);
        rates.insert("ZZZ".to_string(), f64::NAN);

        assert_eq!(extract_rate(&rates, "EUR").unwrap(), 0.92);
        assert_eq!(
            extract_rate(&rates, "GBP"),
            Err(FetchError::MissingRate("GBP".to_string()))
        );
        assert_eq!(
            extract_rate(&rates, "XXX"),
            Err(FetchError::InvalidRate("XXX".to_string()))
        );
        assert_eq!(
            extract_rate(&rates, "YYY"),
            Err(FetchError::InvalidRate("YYY".to_string()))
        );
        assert_eq!(
            extract_rate(&rates, "ZZZ"),
            Err(FetchError::InvalidRate("ZZZ".to_string()))
        );
    }

    #[test]
    fn test_user_prefix_per_category() {
        assert_eq!(FetchError::Timeout.user_prefix(), "Request timed out. ");
        assert_eq!(FetchError::Status(500).user_prefix(), "Server error. ");
        assert_eq!(
            FetchError::Network("connexion refusée".to_string()).user_prefix(),
            "Network connection error. "
        );

        // Les échecs restants partagent le préfixe générique (vide)
        assert_eq!(FetchError::Malformed("x".to_string()).user_prefix(), "");
        assert_eq!(FetchError::MissingRate("EUR".to_string()).user_prefix(), "");
        assert_eq!(FetchError::InvalidRate("EUR".to_string()).user_prefix(), "");
        assert_eq!(FetchError::Other("x".to_string()).user_prefix(), "");
    }

    // Test async nécessite tokio test runtime
    // CONCEPT RUST : #[tokio::test]
    // - Macro qui setup un runtime tokio pour le test
    // - Permet d'utiliser .await dans les tests
    #[tokio::test]
    async fn test_fetch_currency_codes() {
        // Test avec un vrai appel API (peut échouer si pas de connexion)
        let result = fetch_currency_codes().await;

        match result {
            Ok(codes) => {
                assert!(!codes.is_empty());
                assert!(codes.iter().any(|c| c == "EUR"));
                println!("✓ Récupéré {} devises", codes.len());
            }
            Err(e) => {
                println!("⚠ Test skippé (pas de connexion?) : {}", e);
            }
        }
    }
}
