use crate::{
    render::{Presence, RenderedContent},
    sink::SinkState,
};

/// The sink request needed to bring the channel message up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOperation {
    Create,
    /// Image, caption and buttons in one edit.
    ReplaceMedia,
    /// Caption and buttons only.
    UpdateCaption,
}

impl SinkOperation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::ReplaceMedia => "replace_media",
            Self::UpdateCaption => "update_caption",
        }
    }
}

/// Compare `next` against what the sink last confirmed.
///
/// Returns `None` when a message exists and already shows exactly `next`.
#[must_use]
pub fn detect(
    state: &SinkState,
    next: &RenderedContent,
    presence: Presence,
) -> Option<SinkOperation> {
    if state.message_id.is_none() {
        return Some(SinkOperation::Create);
    }
    let Some(applied) = &state.applied else {
        // A message we never confirmed content for: rewrite all of it.
        return Some(SinkOperation::ReplaceMedia);
    };

    if applied.presence == presence && applied.content == *next {
        None
    } else if applied.presence != presence || applied.content.media != next.media {
        Some(SinkOperation::ReplaceMedia)
    } else {
        Some(SinkOperation::UpdateCaption)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            render::Button,
            sink::{Applied, MessageId},
        },
    };

    fn content(media: &str, caption: &str) -> RenderedContent {
        RenderedContent {
            media: media.into(),
            caption: caption.into(),
            buttons: Some(vec![vec![Button {
                label: "Watch".into(),
                url: "https://www.twitch.tv/kitty".into(),
            }]]),
        }
    }

    fn applied(content: RenderedContent, presence: Presence) -> SinkState {
        SinkState {
            message_id: Some(MessageId(7)),
            applied: Some(Applied { content, presence }),
        }
    }

    #[test]
    fn no_message_always_creates() {
        let next = content("a.jpg", "hi");
        assert_eq!(
            detect(&SinkState::default(), &next, Presence::Live),
            Some(SinkOperation::Create)
        );
        // Even when stale applied content happens to match.
        let state = SinkState {
            message_id: None,
            applied: Some(Applied {
                content: next.clone(),
                presence: Presence::Live,
            }),
        };
        assert_eq!(detect(&state, &next, Presence::Live), Some(SinkOperation::Create));
    }

    #[test]
    fn identical_content_is_a_noop() {
        for presence in [Presence::Live, Presence::Ended] {
            let c = content("a.jpg", "same");
            assert_eq!(detect(&applied(c.clone(), presence), &c, presence), None);
        }
    }

    #[test]
    fn caption_change_updates_caption() {
        let state = applied(content("a.jpg", "viewers 10"), Presence::Live);
        assert_eq!(
            detect(&state, &content("a.jpg", "viewers 15"), Presence::Live),
            Some(SinkOperation::UpdateCaption)
        );
    }

    #[test]
    fn button_change_updates_caption() {
        let state = applied(content("a.jpg", "x"), Presence::Live);
        let mut next = content("a.jpg", "x");
        next.buttons = None;
        assert_eq!(
            detect(&state, &next, Presence::Live),
            Some(SinkOperation::UpdateCaption)
        );
    }

    #[test]
    fn media_change_replaces_media() {
        let state = applied(content("a.jpg", "x"), Presence::Live);
        assert_eq!(
            detect(&state, &content("b.jpg", "x"), Presence::Live),
            Some(SinkOperation::ReplaceMedia)
        );
    }

    #[test]
    fn presence_flip_replaces_media_even_with_equal_content() {
        let c = content("a.jpg", "x");
        let state = applied(c.clone(), Presence::Live);
        assert_eq!(
            detect(&state, &c, Presence::Ended),
            Some(SinkOperation::ReplaceMedia)
        );
    }

    #[test]
    fn unknown_applied_content_replaces_media() {
        let state = SinkState {
            message_id: Some(MessageId(1)),
            applied: None,
        };
        assert_eq!(
            detect(&state, &content("a.jpg", "x"), Presence::Live),
            Some(SinkOperation::ReplaceMedia)
        );
    }
}
