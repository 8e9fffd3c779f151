//! GIF animations for game events, with text fallback when a file is missing

use std::path::{Path, PathBuf};

use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Feeding,
    Fight,
    Daily,
    Walk,
}

#[derive(Debug)]
pub struct Animation {
    pub kind: MediaKind,
    pub key: &'static str,
    pub file: &'static str,
    pub caption: &'static str,
    /// Sent instead of the animation when the file is not available
    pub alt_text: &'static str,
}

pub const ANIMATIONS: &[Animation] = &[
    Animation {
        kind: MediaKind::Feeding,
        key: "banana",
        file: "feeding_banana.gif",
        caption: "🍌 Макака с удовольствием ест банан!",
        alt_text: "🍌 Макака ест банан!",
    },
    Animation {
        kind: MediaKind::Feeding,
        key: "meat",
        file: "feeding_meat.gif",
        caption: "🥩 Макака уплетает мясо!",
        alt_text: "🥩 Макака ест мясо!",
    },
    Animation {
        kind: MediaKind::Feeding,
        key: "cake",
        file: "feeding_cake.gif",
        caption: "🍰 Макака наслаждается тортом!",
        alt_text: "🍰 Макака ест торт!",
    },
    Animation {
        kind: MediaKind::Feeding,
        key: "salad",
        file: "feeding_salad.gif",
        caption: "🥗 Макака хрустит салатом!",
        alt_text: "🥗 Макака ест салат!",
    },
    Animation {
        kind: MediaKind::Fight,
        key: "start",
        file: "fight_start.gif",
        caption: "🥊 Бой начинается!",
        alt_text: "🥊 Начало боя!",
    },
    Animation {
        kind: MediaKind::Fight,
        key: "win",
        file: "fight_win.gif",
        caption: "🎉 ПОБЕДА! Ваша макака победила!",
        alt_text: "🎉 Победа в бою!",
    },
    Animation {
        kind: MediaKind::Fight,
        key: "lose",
        file: "fight_lose.gif",
        caption: "😔 Поражение... Ваша макака проиграла.",
        alt_text: "😔 Поражение в бою",
    },
    Animation {
        kind: MediaKind::Daily,
        key: "reward",
        file: "daily_reward.gif",
        caption: "🎁 Ежедневная награда!",
        alt_text: "🎁 Ежедневная награда!",
    },
    Animation {
        kind: MediaKind::Walk,
        key: "walking",
        file: "walking.gif",
        caption: "🚶 Вы гуляете с макакой!",
        alt_text: "🚶 Прогулка с макакой!",
    },
];

pub fn find_animation(kind: MediaKind, key: &str) -> Option<&'static Animation> {
    ANIMATIONS.iter().find(|a| a.kind == kind && a.key == key)
}

impl Animation {
    pub fn path(&self, media_dir: &Path) -> PathBuf {
        media_dir.join(self.file)
    }
}

/// Send an animation with `extra` appended to its caption.
/// Falls back to plain text when the GIF is missing. Failures are logged only.
pub async fn send_animation(
    bot: &Bot,
    chat_id: ChatId,
    media_dir: &Path,
    kind: MediaKind,
    key: &str,
    extra: &str,
) {
    let Some(animation) = find_animation(kind, key) else {
        warn!(?kind, key, "Unknown animation");
        return;
    };

    let path = animation.path(media_dir);
    let result = if path.is_file() {
        let caption = join_caption(animation.caption, extra);
        bot.send_animation(chat_id, InputFile::file(path))
            .caption(caption)
            .await
            .map(|_| ())
    } else {
        bot.send_message(chat_id, join_caption(animation.alt_text, extra))
            .await
            .map(|_| ())
    };

    if let Err(e) = result {
        warn!(chat_id = %chat_id, key, error = %e, "Failed to send animation");
    }
}

fn join_caption(head: &str, extra: &str) -> String {
    if extra.is_empty() {
        head.to_string()
    } else {
        format!("{}\n{}", head, extra)
    }
}
