//! Localized message text for a daily document
//!
//! ```text
//! May 01
//!
//! __General challenges__
//! Complete a bounty: **3**
//! Skin a deer: **1**
//!
//! __Trader challenges__
//! Sell 3 items: **$500**
//! ```

use crate::i18n::Translator;
use crate::models::DailyDocument;

/// Render `document` for `locale`
///
/// Every category of the document gets its heading, even with no challenges.
/// Category titles are looked up as `categories.<key>`; challenge texts are
/// looked up by their own text and fall back to it untranslated.
pub fn render(document: &DailyDocument, locale: &str, translator: &dyn Translator) -> String {
    let mut sections = vec![document.date.format("%B %d").to_string()];

    for (category, challenges) in &document.categories {
        let title = translator.translate(locale, &format!("categories.{}", category.key()));
        let mut lines = vec![format!("__{title}__")];
        lines.extend(challenges.iter().map(|challenge| {
            format!(
                "{}: **{}**",
                translator.translate(locale, &challenge.text),
                challenge.ordinal
            )
        }));
        sections.push(lines.join("\n"));
    }

    sections.join("\n\n")
}
