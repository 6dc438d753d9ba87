use std::fmt;
use std::str::FromStr;

/// Language editions of Wikipedia the viewer supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageCode {
    En,
    Fr,
    De,
    Es,
    It,
    Pt,
    Ru,
    Ja,
    Zh,
    Ar,
}

impl LanguageCode {
    /// Every supported language, in allow-list order
    pub const ALL: [LanguageCode; 10] = [
        Self::En,
        Self::Fr,
        Self::De,
        Self::Es,
        Self::It,
        Self::Pt,
        Self::Ru,
        Self::Ja,
        Self::Zh,
        Self::Ar,
    ];

    /// Returns the subdomain code of this language edition
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
            Self::De => "de",
            Self::Es => "es",
            Self::It => "it",
            Self::Pt => "pt",
            Self::Ru => "ru",
            Self::Ja => "ja",
            Self::Zh => "zh",
            Self::Ar => "ar",
        }
    }

    /// Looks up a language code, ignoring ASCII case
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.to_ascii_lowercase();
        Self::ALL.into_iter().find(|lang| lang.as_str() == code)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| s.to_string())
    }
}
