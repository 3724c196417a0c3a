//! # SKU Generation
//!
//! Builds the next free `<PREFIX>-NNN` SKU for a new product name.
//!
//! ```text
//! "Cuaderno decorado"  ──► prefix "CU" ──► existing CU-001, CU-007
//!                                      ──► "CU-008"
//! "  123 !!"           ──► no word with a letter ──► prefix "PF"
//! ```

/// Prefix used when a name has no word containing a letter.
pub const DEFAULT_SKU_PREFIX: &str = "PF";

/// Folds the accented letters used in Spanish product names to ASCII.
fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'Á' | 'À' | 'Ä' | 'Â' | 'Ã' => 'A',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'É' | 'È' | 'Ë' | 'Ê' => 'E',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'O',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        other => other,
    }
}

/// Two-character prefix derived from `name`.
pub fn sku_prefix(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(fold_accent)
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .find(|tok| tok.chars().any(|c| c.is_ascii_alphabetic()))
        .map(|tok| tok.chars().take(2).collect::<String>().to_uppercase())
        .unwrap_or_else(|| DEFAULT_SKU_PREFIX.to_string())
}

/// Sequence number of `sku` if it has the form `<prefix>-NNN`.
fn sequence_of(sku: &str, prefix: &str) -> Option<u32> {
    let upper = sku.trim().to_uppercase();
    let digits = upper.strip_prefix(prefix)?.strip_prefix('-')?;
    if digits.len() == 3 && digits.chars().all(|c| c.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}

/// Next unused SKU for `name` given the SKUs already in stock.
///
/// ## Example
/// ```rust
/// use papeleria_core::sku::generate_sku;
///
/// let existing = ["CU-001", "cu-007", "CUA-100"];
/// assert_eq!(generate_sku("Cuaderno decorado", existing), "CU-008");
/// assert_eq!(generate_sku("¡¡ 42 !!", Vec::<&str>::new()), "PF-001");
/// ```
pub fn generate_sku<I, S>(name: &str, existing: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let prefix = sku_prefix(name);
    let taken: Vec<String> = existing
        .into_iter()
        .map(|s| s.as_ref().trim().to_uppercase())
        .collect();

    let max = taken
        .iter()
        .filter_map(|sku| sequence_of(sku, &prefix))
        .max()
        .unwrap_or(0);

    let mut seq = max + 1;
    loop {
        let candidate = format!("{}-{:03}", prefix, seq);
        if !taken.contains(&candidate) {
            return candidate;
        }
        seq += 1;
    }
}
