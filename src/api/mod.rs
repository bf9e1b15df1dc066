// ============================================================================
// Module : api
// ============================================================================
// Ce module contient le client API pour récupérer les taux de change
// depuis le service distant (exchangerate-api.com)
// ============================================================================

pub mod rates; // Client API des taux de change

// Re-export des fonctions principales
pub use rates::{
    fetch_conversion_rate, fetch_currency_codes, FetchError, CONVERSION_TIMEOUT,
    CURRENCY_LIST_TIMEOUT,
};
