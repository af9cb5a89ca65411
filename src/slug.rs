//! Pure string transforms shared by routing, taxonomy resolution and DTOs.

/// Turn an arbitrary display value into a URL-safe slug: lowercase, fold
/// common Latin diacritics, collapse every other non-alphanumeric run into a
/// single hyphen. Idempotent.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for ch in input.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen {
                out.push('-');
                pending_hyphen = false;
            }
            out.push(ch);
        } else if let Some(folded) = fold_diacritic(ch) {
            if pending_hyphen {
                out.push('-');
                pending_hyphen = false;
            }
            out.push_str(folded);
        } else if !out.is_empty() {
            pending_hyphen = true;
        }
    }

    out
}

/// ASCII form of a folded lowercase Latin character; `None` for anything
/// that acts as a separator instead.
fn fold_diacritic(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => "a",
        'è' | 'é' | 'ê' | 'ë' | 'ē' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'ī' => "i",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => "u",
        'ý' | 'ÿ' => "y",
        'ñ' => "n",
        'ç' => "c",
        'š' => "s",
        'ž' => "z",
        'ð' => "d",
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        'þ' => "th",
        _ => return None,
    };
    Some(folded)
}

/// Compact display form of a counter: 999 -> "999", 1_234 -> "1.2K",
/// 4_500_000 -> "4.5M".
pub fn format_compact(value: i64) -> String {
    const SCALES: &[(i64, &str)] = &[(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "K")];

    for &(scale, suffix) in SCALES {
        if value.abs() >= scale {
            #[allow(clippy::cast_precision_loss)]
            let scaled = value as f64 / scale as f64;
            let mut label = format!("{scaled:.1}");
            if let Some(trimmed) = label.strip_suffix(".0") {
                label = trimmed.to_string();
            }
            return format!("{label}{suffix}");
        }
    }

    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Demon Slayer"), "demon-slayer");
        assert_eq!(slugify("  Spaced   Out  "), "spaced-out");
        assert_eq!(slugify("Re:Zero (Season 2)"), "re-zero-season-2");
    }

    #[test]
    fn test_slugify_is_idempotent() {
        for input in ["Ongoing", "Pokémon: The Movie", "86 -Eighty Six-"] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once);
        }
    }

    #[test]
    fn test_slugify_case_and_diacritic_insensitive() {
        assert_eq!(slugify("POKÉMON"), slugify("pokemon"));
        assert_eq!(slugify("Shōnen"), slugify("shonen"));
        assert_eq!(slugify("Fräulein"), "fraulein");
    }

    #[test]
    fn test_slugify_non_latin_becomes_separator() {
        assert_eq!(slugify("進撃 Attack"), "attack");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(0), "0");
        assert_eq!(format_compact(999), "999");
        assert_eq!(format_compact(1_000), "1K");
        assert_eq!(format_compact(1_234), "1.2K");
        assert_eq!(format_compact(4_500_000), "4.5M");
        assert_eq!(format_compact(2_000_000_000), "2B");
    }
}
