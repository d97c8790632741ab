use {
    onair_reconciler::ButtonLayout,
    teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup},
    tracing::warn,
};

/// Inline keyboard of URL buttons. Buttons with an unusable URL are
/// dropped, as are rows left empty.
#[must_use]
pub fn inline_keyboard(layout: &ButtonLayout) -> Option<InlineKeyboardMarkup> {
    let rows: Vec<Vec<InlineKeyboardButton>> = layout
        .iter()
        .map(|row| {
            row.iter()
                .filter_map(|button| match reqwest::Url::parse(&button.url) {
                    Ok(url) => Some(InlineKeyboardButton::url(button.label.clone(), url)),
                    Err(e) => {
                        warn!(
                            label = %button.label,
                            url = %button.url,
                            error = %e,
                            "skipping button with invalid url"
                        );
                        None
                    },
                })
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    (!rows.is_empty()).then(|| InlineKeyboardMarkup::new(rows))
}
