//! Localized strings for the chat client: the system prompt and the
//! fixed user-facing error messages.

/// Supplies the synthesized system-prompt text. Injected into the
/// session store so it doesn't reach into another subsystem's state.
pub trait PromptProvider {
    fn system_prompt(&self) -> String;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Locale {
    En,
    Cs,
}

impl Locale {
    /// Parse a locale tag. Unrecognized tags silently fall back to
    /// English, matching how a missing preference behaves.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_lowercase().as_str() {
            "cs" | "cs-cz" => Locale::Cs,
            _ => Locale::En,
        }
    }

    pub fn connection_error(&self) -> &'static str {
        match self {
            Locale::En => {
                "Sorry, I couldn't reach the inference server. \
                 Please check that the vLLM backend is running and try again."
            }
            Locale::Cs => {
                "Omlouvám se, nepodařilo se mi spojit s inferenčním serverem. \
                 Zkontrolujte prosím, že vLLM backend běží, a zkuste to znovu."
            }
        }
    }

    pub fn no_model_warning(&self) -> &'static str {
        match self {
            Locale::En => {
                "No model is available yet. Please wait for the backend \
                 to report a loaded model and try again."
            }
            Locale::Cs => {
                "Zatím není k dispozici žádný model. Počkejte prosím, než \
                 backend nahlásí načtený model, a zkuste to znovu."
            }
        }
    }
}

impl PromptProvider for Locale {
    fn system_prompt(&self) -> String {
        match self {
            Locale::En => String::from(
                "You are AlergieAI, a helpful assistant specialized in \
                 allergies. Answer clearly and concisely. You are not a \
                 doctor and serious symptoms should be checked by one.",
            ),
            Locale::Cs => String::from(
                "Jsi AlergieAI, užitečný asistent specializovaný na \
                 alergie. Odpovídej jasně a stručně. Nejsi lékař a vážné \
                 příznaky má posoudit lékař.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_recognizes_czech() {
        assert_eq!(Locale::from_tag("cs"), Locale::Cs);
        assert_eq!(Locale::from_tag("CS-CZ"), Locale::Cs);
    }

    #[test]
    fn test_from_tag_defaults_to_english() {
        assert_eq!(Locale::from_tag("en"), Locale::En);
        assert_eq!(Locale::from_tag("fr"), Locale::En);
        assert_eq!(Locale::from_tag(""), Locale::En);
    }

    #[test]
    fn test_locales_have_distinct_prompts() {
        assert_ne!(Locale::En.system_prompt(), Locale::Cs.system_prompt());
        assert_ne!(Locale::En.connection_error(), Locale::Cs.connection_error());
    }
}
