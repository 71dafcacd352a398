use crate::lexicon::Lexicon;

/// Canonicalizes raw component mentions so different spellings compare fairly.
///
/// Steps, in order:
/// 1. lowercase and trim
/// 2. expand known abbreviations on word boundaries (`temp` -> `temperature`)
/// 3. drop qualifier words followed by whitespace (`main`, `primary`, ...)
/// 4. drop trailing role words (`unit`, `module`, `system`, `component`)
/// 5. collapse whitespace
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    lexicon: &'static Lexicon,
}

/// Maximal run of word characters or of everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Word(&'a str),
    Gap(&'a str),
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_word: Option<bool> = None;

    for (idx, c) in text.char_indices() {
        let word = is_word_char(c);
        match in_word {
            Some(current) if current != word => {
                out.push(make_segment(&text[start..idx], current));
                start = idx;
            }
            _ => {}
        }
        in_word = Some(word);
    }
    if let Some(current) = in_word {
        out.push(make_segment(&text[start..], current));
    }
    out
}

fn make_segment(slice: &str, word: bool) -> Segment<'_> {
    if word {
        Segment::Word(slice)
    } else {
        Segment::Gap(slice)
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::with_lexicon(Lexicon::shared())
    }

    pub fn with_lexicon(lexicon: &'static Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &'static Lexicon {
        self.lexicon
    }

    /// Normalize a component name. Total: empty or blank input yields `""`.
    pub fn normalize(&self, name: &str) -> String {
        let lowered = name.to_lowercase();
        let expanded = self.expand_abbreviations(lowered.trim());
        let without_qualifiers = self.strip_qualifiers(&expanded);
        let without_roles = self.strip_role_suffixes(without_qualifiers);
        without_roles.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn expand_abbreviations(&self, text: &str) -> String {
        segments(text)
            .into_iter()
            .map(|segment| match segment {
                Segment::Word(word) => self.lexicon.expand(word).unwrap_or(word),
                Segment::Gap(gap) => gap,
            })
            .collect()
    }

    fn strip_qualifiers(&self, text: &str) -> String {
        let segs = segments(text);
        let mut out = String::with_capacity(text.len());
        let mut skip_leading_ws = false;

        for (idx, segment) in segs.iter().enumerate() {
            match *segment {
                Segment::Word(word) => {
                    let followed_by_ws = matches!(
                        segs.get(idx + 1),
                        Some(Segment::Gap(gap)) if gap.starts_with(char::is_whitespace)
                    );
                    if self.lexicon.is_qualifier(word) && followed_by_ws {
                        skip_leading_ws = true;
                    } else {
                        out.push_str(word);
                    }
                }
                Segment::Gap(gap) => {
                    if skip_leading_ws {
                        out.push_str(gap.trim_start());
                        skip_leading_ws = false;
                    } else {
                        out.push_str(gap);
                    }
                }
            }
        }
        out
    }

    fn strip_role_suffixes(&self, mut text: String) -> String {
        loop {
            let segs = segments(&text);
            let n = segs.len();
            if n < 2 {
                return text;
            }
            let (Segment::Gap(gap), Segment::Word(last)) = (segs[n - 2], segs[n - 1]) else {
                return text;
            };
            if !self.lexicon.is_role_suffix(last) || !gap.ends_with(char::is_whitespace) {
                return text;
            }
            let keep = text.len() - last.len() - (gap.len() - gap.trim_end().len());
            text.truncate(keep);
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn norm(s: &str) -> String {
        Normalizer::new().normalize(s)
    }

    #[test]
    fn test_abbreviation_and_role_suffix() {
        assert_eq!(norm("Temp Ctrl Module"), "temperature control");
        assert_eq!(norm("Temperature Control Unit"), "temperature control");
    }

    #[test]
    fn test_abbreviations_respect_word_boundaries() {
        assert_eq!(norm("temp-sensor"), "temperature-sensor");
        assert_eq!(norm("Template Loader"), "template loader");
    }

    #[test]
    fn test_qualifiers_stripped() {
        assert_eq!(norm("Main Laser Diode"), "laser diode");
        assert_eq!(norm("backup  primary pump"), "pump");
        assert_eq!(norm("pump main"), "pump main");
    }

    #[test]
    fn test_role_suffix_only_at_end() {
        assert_eq!(norm("Unit Converter"), "unit converter");
        assert_eq!(norm("Detector Unit Module"), "detector");
        assert_eq!(norm("Module"), "module");
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(norm(""), "");
        assert_eq!(norm("   \t "), "");
    }

    proptest! {
        #[test]
        fn proptest_normalize_is_idempotent(
            words in proptest::collection::vec(
                prop_oneof![
                    Just("main".to_string()),
                    Just("backup".to_string()),
                    Just("unit".to_string()),
                    Just("module".to_string()),
                    Just("sys".to_string()),
                    Just("temp".to_string()),
                    Just("ctrl".to_string()),
                    "[A-Za-z]{1,8}",
                ],
                0..6,
            ),
            sep in "[ \t-]{1,2}",
        ) {
            let raw = words.join(&sep);
            let once = norm(&raw);
            prop_assert_eq!(norm(&once), once.clone());
        }

        #[test]
        fn proptest_normalize_is_case_insensitive(raw in "[A-Za-z ]{0,30}") {
            prop_assert_eq!(norm(&raw.to_uppercase()), norm(&raw.to_lowercase()));
        }
    }
}
