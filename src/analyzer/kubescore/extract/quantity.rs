//! Resource quantity parsing.
//!
//! Converts Kubernetes quantity strings ("500m", "1.5", "128Mi", "1G") into a
//! plain number of base units so requests and limits can be compared.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use regex::Regex;
use once_cell::sync::Lazy;

// ============================================================================
// Parsing
// ============================================================================

// Sign, digits with an optional fraction (`1`, `1.`, `1.5`, `.5`) and an
// optional decimal exponent, then an optional suffix.
static QUANTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)(m|Ki|Mi|Gi|Ti|Pi|Ei|k|K|M|G|T|P|E)?$",
    )
    .expect("static regex")
});

/// Parse a quantity string into base units.
///
/// # Examples
/// - "500m" -> 0.5
/// - "2" -> 2.0
/// - "128Mi" -> 134217728.0
/// - "1G" -> 1000000000.0
/// - "1e3" -> 1000.0
pub fn parse_quantity(value: &str) -> Option<f64> {
    let caps = QUANTITY_REGEX.captures(value.trim())?;
    let number: f64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2).map(|m| m.as_str()).unwrap_or("");

    let multiplier: f64 = match unit {
        "" => 1.0,
        "m" => 1e-3,
        "Ki" => 1024.0,
        "Mi" => 1024f64.powi(2),
        "Gi" => 1024f64.powi(3),
        "Ti" => 1024f64.powi(4),
        "Pi" => 1024f64.powi(5),
        "Ei" => 1024f64.powi(6),
        // Decimal units
        "k" | "K" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        _ => return None,
    };

    Some(number * multiplier)
}

// ============================================================================
// Comparison helpers
// ============================================================================

/// True when the quantity is absent, zero, or unparseable.
pub fn is_unset(quantity: Option<&Quantity>) -> bool {
    quantity
        .and_then(|q| parse_quantity(&q.0))
        .is_none_or(|v| v == 0.0)
}

/// Numeric equality of two quantities; both must be present and parseable.
pub fn quantities_equal(a: Option<&Quantity>, b: Option<&Quantity>) -> bool {
    match (
        a.and_then(|q| parse_quantity(&q.0)),
        b.and_then(|q| parse_quantity(&q.0)),
    ) {
        (Some(a), Some(b)) => (a - b).abs() <= f64::EPSILON * a.abs().max(b.abs()).max(1.0),
        _ => false,
    }
}
