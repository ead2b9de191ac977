//! Ticker validation and per-vendor symbol mapping.
//!
//! Canonical tickers use the `.DE` suffix for German listings (`SAP.DE`).
//! Finnhub instead addresses those instruments as `XETRA:<base>`; the other
//! vendors take the canonical form verbatim. The mapping table covers the
//! DAX and MDAX constituents and is loaded once into forward and reverse
//! lookup maps.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::connector::ProviderId;
use crate::error::FeedError;

/// `.DE` base symbols with a known `XETRA:` listing on Finnhub.
const XETRA_BASES: &[&str] = &[
    // DAX
    "SAP", "SIE", "BMW", "BAS", "DAI", "ALV", "BAYN", "ADS", "DBK", "DTE", "AIR", "BEI", "CON",
    "DHL", "EOAN", "FRE", "HEI", "HEN3", "IFX", "LIN", "MRK", "MTX", "MUV2", "PAH3", "PUM", "RWE",
    "SY1", "VOW3", "VNA", "ZAL",
    // MDAX
    "AFX", "BC8", "COP", "EVD", "EVK", "FIE", "FME", "FPE", "FRA", "G1A", "GXI", "HNR1", "HOT",
    "JUN3", "KGX", "LEG", "NDA", "O2D", "OSR", "PFV", "PSM", "RAA", "RHK", "SAX", "SDF", "SHL",
    "SIX2", "SRT", "TKA", "TLX",
];

static DE_TO_XETRA: LazyLock<HashMap<String, String>> = LazyLock::new(|| {
    XETRA_BASES
        .iter()
        .map(|base| (format!("{base}.DE"), format!("XETRA:{base}")))
        .collect()
});

static XETRA_TO_DE: LazyLock<HashMap<String, String>> = LazyLock::new(|| {
    DE_TO_XETRA
        .iter()
        .map(|(de, xetra)| (xetra.clone(), de.clone()))
        .collect()
});

/// Upper-case and validate a caller-supplied ticker.
///
/// The allowed charset is `[A-Z0-9.\-]`; anything else (including the empty
/// string) is [`FeedError::UnsupportedTickerFormat`].
pub fn canonicalize(ticker: &str) -> Result<String, FeedError> {
    let upper = ticker.trim().to_ascii_uppercase();
    let valid = !upper.is_empty()
        && upper
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.' || c == '-');
    if valid {
        Ok(upper)
    } else {
        Err(FeedError::UnsupportedTickerFormat {
            ticker: ticker.to_string(),
        })
    }
}

/// Convert a canonical ticker into the form `provider` expects.
///
/// Only Finnhub remaps German `.DE` listings; every other vendor, and every
/// ticker without a table entry, passes through unchanged.
pub fn to_provider_format(ticker: &str, provider: ProviderId) -> Result<String, FeedError> {
    let canonical = canonicalize(ticker)?;
    if provider == ProviderId::Finnhub
        && let Some(mapped) = DE_TO_XETRA.get(&canonical)
    {
        return Ok(mapped.clone());
    }
    Ok(canonical)
}

/// Convert a provider-format symbol back to the canonical form.
///
/// The inverse of [`to_provider_format`]: `XETRA:SAP` coming back from
/// Finnhub becomes `SAP.DE`; unmapped symbols pass through unchanged.
#[must_use]
pub fn to_canonical_format(symbol: &str, provider: ProviderId) -> String {
    if provider == ProviderId::Finnhub
        && let Some(mapped) = XETRA_TO_DE.get(symbol)
    {
        return mapped.clone();
    }
    symbol.to_string()
}
