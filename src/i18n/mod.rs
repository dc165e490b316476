//! Internationalization (i18n) support
//!
//! Catalogs live under `locales/` and are compiled in by `rust-i18n`. Unlike a
//! process-wide "current locale", every lookup here names its locale
//! explicitly, so renderings for destinations with different locales can run
//! side by side.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rdo_dailies::i18n::{CatalogTranslator, Translator};
//!
//! let translator = CatalogTranslator;
//! let title = translator.translate("ru", "categories.trader");
//! ```

// Note: rust_i18n::i18n! macro is declared in lib.rs (crate root)

/// Locale used when a destination's locale has no catalog
pub const FALLBACK_LOCALE: &str = "en";

/// Translation capability consumed by rendering
pub trait Translator: Send + Sync {
    /// Translate `key` into `locale`; returns `key` itself when no entry exists
    fn translate(&self, locale: &str, key: &str) -> String;
}

/// [`Translator`] backed by the compiled `locales/` catalogs
#[derive(Debug, Default, Clone, Copy)]
pub struct CatalogTranslator;

impl Translator for CatalogTranslator {
    fn translate(&self, locale: &str, key: &str) -> String {
        let locale = normalize_locale(locale);
        let translated = t!(key, locale = locale.as_str()).to_string();

        // rust-i18n echoes the key (optionally locale-prefixed) when missing
        if translated == key || translated == format!("{locale}.{key}") {
            key.to_string()
        } else {
            translated
        }
    }
}

/// Locales with a compiled catalog
pub fn available_locales() -> Vec<String> {
    let mut locales: Vec<String> = rust_i18n::available_locales!()
        .into_iter()
        .map(|l| l.to_string())
        .collect();
    locales.sort();
    locales
}

/// Normalize a language tag to a catalog name
///
/// `ru-RU`, `ru_RU` and `RU` all map to `ru`; tags without a catalog map to
/// [`FALLBACK_LOCALE`].
pub fn normalize_locale(locale: &str) -> String {
    let language = locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    if available_locales().iter().any(|l| *l == language) {
        language
    } else {
        FALLBACK_LOCALE.to_string()
    }
}

/// Translate a key with optional parameters
///
/// This is a re-export of rust_i18n::t! for convenience.
#[doc(inline)]
pub use rust_i18n::t;
