use deunicode::deunicode;

/// URL-safe form of a name: lowercase ASCII letters, digits and single `-`
/// separators. Non-Latin text is transliterated first; whitespace, `-` and
/// `_` separate words and anything else is dropped.
///
/// ```
/// assert_eq!(domain_catalog::slugify("Men's  Shoes & Bags"), "mens-shoes-bags");
/// assert_eq!(domain_catalog::slugify("Crème Brûlée"), "creme-brulee");
/// ```
pub fn slugify(name: &str) -> String {
    let ascii = deunicode(name);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_separator = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_separator = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_joins_words() {
        assert_eq!(slugify("Home Appliances"), "home-appliances");
    }

    #[test]
    fn test_collapses_and_trims_separators() {
        assert_eq!(slugify("  --Smart   TVs__ 4K-- "), "smart-tvs-4k");
    }

    #[test]
    fn test_drops_special_characters() {
        assert_eq!(slugify("A & B"), "a-b");
        assert_eq!(slugify("C++/Rust!"), "crust");
    }

    #[test]
    fn test_transliterates_accents() {
        assert_eq!(slugify("Café"), "cafe");
        assert_ne!(slugify("Café"), slugify("Caf!"));
    }

    #[test]
    fn test_transliterates_non_latin_scripts() {
        let phones = slugify("هواتف");
        let clothes = slugify("ملابس");
        assert!(!phones.is_empty());
        assert!(!clothes.is_empty());
        assert_ne!(phones, clothes);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify(" - "), "");
    }
}
