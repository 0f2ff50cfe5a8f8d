//! Transliteration of file and directory names to ASCII.

/// Converts text to an ASCII-safe form.
pub trait Transliterator: Send + Sync {
    /// Transliterate `text`, replacing characters without an ASCII form by
    /// `unknown`, and return at most `max_length` characters.
    fn transliterate(&self, text: &str, unknown: char, max_length: usize) -> String;
}

/// Transliterator for Latin-script text.
///
/// Accented Latin letters are folded to their base letter and ligatures are
/// expanded; every other non-ASCII character becomes the unknown character.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatinTransliterator;

fn fold(c: char) -> Option<&'static str> {
    let folded = match c {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'Ç' | 'Ć' | 'Č' => "C",
        'ç' | 'ć' | 'č' => "c",
        'Ď' | 'Đ' | 'Ð' => "D",
        'ď' | 'đ' | 'ð' => "d",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'Ğ' => "G",
        'ğ' => "g",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'İ' => "I",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'Ł' => "L",
        'ł' => "l",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ñ' | 'ń' | 'ň' => "n",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'Ř' => "R",
        'ř' => "r",
        'Ś' | 'Š' | 'Ş' => "S",
        'ś' | 'š' | 'ş' => "s",
        'Ť' | 'Ţ' => "T",
        'ť' | 'ţ' => "t",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => "U",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ý' | 'Ÿ' => "Y",
        'ý' | 'ÿ' => "y",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ź' | 'ż' | 'ž' => "z",
        'Æ' => "AE",
        'æ' => "ae",
        'Œ' => "OE",
        'œ' => "oe",
        'ß' => "ss",
        'Þ' => "TH",
        'þ' => "th",
        _ => return None,
    };
    Some(folded)
}

impl Transliterator for LatinTransliterator {
    fn transliterate(&self, text: &str, unknown: char, max_length: usize) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if c.is_ascii() {
                out.push(c);
            } else if let Some(folded) = fold(c) {
                out.push_str(folded);
            } else {
                out.push(unknown);
            }
        }
        out.chars().take(max_length).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_unchanged() {
        assert_eq!(
            LatinTransliterator.transliterate("public://pictures/2024-03", '_', 50),
            "public://pictures/2024-03"
        );
    }

    #[test]
    fn test_accents_are_folded() {
        assert_eq!(
            LatinTransliterator.transliterate("Élodie_Straße_Œuvre", '_', 50),
            "Elodie_Strasse_OEuvre"
        );
    }

    #[test]
    fn test_unknown_characters_are_replaced() {
        assert_eq!(LatinTransliterator.transliterate("照片/ok", '_', 50), "__/ok");
    }

    #[test]
    fn test_result_is_truncated() {
        let long = "a".repeat(80);
        assert_eq!(LatinTransliterator.transliterate(&long, '_', 50).len(), 50);
        assert_eq!(LatinTransliterator.transliterate("ßß", '_', 3), "sss");
    }
}
