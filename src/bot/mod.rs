//! Telegram bot - monkey care, duels and inline mode

mod callback;
mod duel;
mod inline;
mod keyboards;
mod media;
mod texts;

use std::sync::Arc;

use chrono::Utc;
use teloxide::{
    ApiError, RequestError,
    dispatching::dialogue::{Dialogue, InMemStorage, InMemStorageError},
    prelude::*,
    types::{InlineKeyboardMarkup, MessageId},
    utils::command::BotCommands,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::db::{self, Database};
use crate::error::GameError;
use crate::game::{ChallengeBook, find_food, service};
use callback::CallbackAction;
use media::MediaKind;

type MyDialogue = Dialogue<State, InMemStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type Db = Arc<Mutex<Database>>;

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    /// Waiting for the new monkey name
    WaitingForName,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Команды бота:")]
pub enum Command {
    #[command(description = "Начать игру")]
    Start,
    #[command(description = "Показать помощь")]
    Help,
    #[command(description = "Моя макака")]
    My,
    #[command(description = "Топ макак по весу")]
    Top,
    #[command(description = "Переименовать макаку")]
    Name(String),
}

/// Where the answer to an update goes: edit the message with the pressed
/// button, or send a new one to the chat
#[derive(Debug, Clone, Copy)]
struct Target {
    chat_id: ChatId,
    message_id: Option<MessageId>,
}

impl Target {
    fn chat(chat_id: ChatId) -> Self {
        Self { chat_id, message_id: None }
    }
}

/// Rename waits for the next message in the user's private chat, so text
/// from other members of a group is never taken as the new name
async fn begin_rename(
    storage: &Arc<InMemStorage<State>>,
    user_id: i64,
) -> Result<ChatId, InMemStorageError> {
    let private = ChatId(user_id);
    MyDialogue::new(storage.clone(), private)
        .update(State::WaitingForName)
        .await?;
    Ok(private)
}

fn account(user: &teloxide::types::User) -> db::User {
    db::User {
        id: user.id.0 as i64,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
    }
}

async fn show(bot: &Bot, target: Target, text: String, keyboard: InlineKeyboardMarkup) -> HandlerResult {
    if let Some(message_id) = target.message_id {
        match bot
            .edit_message_text(target.chat_id, message_id, text.clone())
            .reply_markup(keyboard.clone())
            .await
        {
            Ok(_) => return Ok(()),
            Err(RequestError::Api(ApiError::MessageNotModified)) => return Ok(()),
            Err(e) => debug!(chat_id = %target.chat_id, error = %e, "Edit failed, sending new message"),
        }
    }
    bot.send_message(target.chat_id, text)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

/// Text for a failed action; internal failures are logged and hidden
fn failure_text(err: &(dyn std::error::Error + Send + Sync + 'static)) -> String {
    match err.downcast_ref::<GameError>() {
        Some(game) if !game.is_internal() => game.user_message(),
        _ => {
            error!(error = %err, "Action failed");
            texts::GENERIC_ERROR.to_string()
        }
    }
}

/// Start the Telegram bot
pub async fn run_bot(token: String, db_path: &str, settings: Settings) -> anyhow::Result<()> {
    let bot = Bot::new(token);
    let db: Db = Arc::new(Mutex::new(Database::open(db_path)?));
    let book = ChallengeBook::new();
    let settings = Arc::new(settings);

    info!(
        db = db_path,
        challenge_timeout_secs = settings.challenge_timeout.as_secs(),
        media_dir = %settings.media_dir.display(),
        "Starting bot"
    );

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    let handler = dptree::entry()
        .branch(Update::filter_inline_query().endpoint(inline::handle_inline))
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, InMemStorage<State>, State>()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(dptree::case![State::WaitingForName].endpoint(receive_name))
                .branch(dptree::endpoint(handle_message)),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<State>::new(), db, book, settings])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: MyDialogue,
    storage: Arc<InMemStorage<State>>,
    db: Db,
    settings: Arc<Settings>,
) -> HandlerResult {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user = account(from);
    let target = Target::chat(msg.chat.id);
    dialogue.reset().await?;

    let result = run_command(&bot, target, &user, cmd, &storage, &db, &settings).await;
    if let Err(e) = result {
        bot.send_message(msg.chat.id, failure_text(e.as_ref())).await?;
    }
    Ok(())
}

async fn run_command(
    bot: &Bot,
    target: Target,
    user: &db::User,
    cmd: Command,
    storage: &Arc<InMemStorage<State>>,
    db: &Db,
    settings: &Settings,
) -> HandlerResult {
    let now = Utc::now();
    match cmd {
        Command::Start => {
            {
                let db = db.lock().await;
                db.upsert_user(user)?;
                service::refresh_monkey(&db, user.id, now)?;
            }
            info!(user_id = user.id, username = ?user.username, "User started");
            show(bot, target, texts::welcome(), keyboards::main_menu()).await?;
        }

        Command::Help => {
            let text = format!("{}\n\n{}", texts::help(), Command::descriptions());
            show(bot, target, text, keyboards::back_to_menu()).await?;
        }

        Command::My => {
            let monkey = {
                let db = db.lock().await;
                db.upsert_user(user)?;
                service::refresh_monkey(&db, user.id, now)?
            };
            show(bot, target, texts::monkey_card(&monkey, now), keyboards::main_menu()).await?;
        }

        Command::Top => {
            let top = db.lock().await.top_monkeys(settings.top_limit)?;
            show(bot, target, texts::top(&top), keyboards::back_to_menu()).await?;
        }

        Command::Name(name) if name.trim().is_empty() => {
            let private = begin_rename(storage, user.id).await?;
            bot.send_message(private, texts::rename_prompt()).await?;
        }

        Command::Name(name) => {
            let monkey = {
                let db = db.lock().await;
                db.upsert_user(user)?;
                service::rename(&db, user.id, &name, now)?
            };
            show(bot, target, texts::renamed(&monkey), keyboards::main_menu()).await?;
        }
    }
    Ok(())
}

async fn receive_name(bot: Bot, msg: Message, dialogue: MyDialogue, db: Db) -> HandlerResult {
    let (Some(from), Some(text)) = (msg.from.as_ref(), msg.text()) else {
        bot.send_message(msg.chat.id, texts::rename_prompt()).await?;
        return Ok(());
    };
    let user = account(from);

    let renamed = {
        let db = db.lock().await;
        db.upsert_user(&user)?;
        service::rename(&db, user.id, text, Utc::now())
    };

    match renamed {
        Ok(monkey) => {
            dialogue.reset().await?;
            info!(user_id = user.id, name = %monkey.name, "Monkey renamed");
            bot.send_message(msg.chat.id, texts::renamed(&monkey))
                .reply_markup(keyboards::main_menu())
                .await?;
        }
        // stay in the dialogue until a valid name arrives
        Err(e @ GameError::InvalidName(_)) => {
            bot.send_message(msg.chat.id, e.user_message()).await?;
        }
        Err(e) => {
            dialogue.reset().await?;
            bot.send_message(msg.chat.id, failure_text(&e)).await?;
        }
    }
    Ok(())
}

async fn handle_message(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "Жми /start чтобы открыть меню")
        .await?;
    Ok(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    storage: Arc<InMemStorage<State>>,
    db: Db,
    book: ChallengeBook,
    settings: Arc<Settings>,
) -> HandlerResult {
    let user = account(&q.from);
    // buttons under inline-mode messages have no message; answer in private chat
    let target = match &q.message {
        Some(m) => Target {
            chat_id: m.chat().id,
            message_id: Some(m.id()),
        },
        None => Target::chat(ChatId(user.id)),
    };

    let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
        warn!(user_id = user.id, data = ?q.data, "Unknown callback data");
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    debug!(user_id = user.id, ?action, "Callback");

    let registered = db.lock().await.upsert_user(&user);
    let result = match registered {
        Ok(()) => run_action(&bot, target, &user, action, &storage, &db, &book, &settings).await,
        Err(e) => Err(e.into()),
    };

    let answer = bot.answer_callback_query(q.id.clone());
    match result {
        Ok(()) => answer.await?,
        Err(e) => answer.text(failure_text(e.as_ref())).show_alert(true).await?,
    };
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_action(
    bot: &Bot,
    target: Target,
    user: &db::User,
    action: CallbackAction,
    storage: &Arc<InMemStorage<State>>,
    db: &Db,
    book: &ChallengeBook,
    settings: &Settings,
) -> HandlerResult {
    let now = Utc::now();
    match action {
        CallbackAction::MainMenu => {
            show(bot, target, texts::welcome(), keyboards::main_menu()).await?;
        }

        CallbackAction::MyMonkey => {
            let monkey = service::refresh_monkey(&*db.lock().await, user.id, now)?;
            show(bot, target, texts::monkey_card(&monkey, now), keyboards::back_to_menu()).await?;
        }

        CallbackAction::SelectFood => {
            show(bot, target, texts::food_menu(), keyboards::food_selection()).await?;
        }

        CallbackAction::FoodInfo(id) => {
            let food = find_food(id).ok_or(GameError::UnknownFood(id))?;
            show(bot, target, texts::food_info(food), keyboards::food_info(id)).await?;
        }

        CallbackAction::Feed(id) => {
            let (monkey, food) = service::feed(&*db.lock().await, user.id, id, now)?;
            show(bot, target, texts::fed(&monkey, food), keyboards::back_to_menu()).await?;
            media::send_animation(
                bot,
                target.chat_id,
                &settings.media_dir,
                MediaKind::Feeding,
                food.media_key,
                &texts::current_weight(&monkey),
            )
            .await;
        }

        CallbackAction::Daily => {
            let monkey = service::claim_daily(&*db.lock().await, user.id, now)?;
            show(bot, target, texts::daily_claimed(&monkey), keyboards::back_to_menu()).await?;
            media::send_animation(
                bot,
                target.chat_id,
                &settings.media_dir,
                MediaKind::Daily,
                "reward",
                &texts::current_weight(&monkey),
            )
            .await;
        }

        CallbackAction::Walk => {
            let monkey = service::walk(&*db.lock().await, user.id, now)?;
            show(bot, target, texts::walked(&monkey), keyboards::back_to_menu()).await?;
            media::send_animation(bot, target.chat_id, &settings.media_dir, MediaKind::Walk, "walking", "")
                .await;
        }

        CallbackAction::Top => {
            let top = db.lock().await.top_monkeys(settings.top_limit)?;
            show(bot, target, texts::top(&top), keyboards::back_to_menu()).await?;
        }

        CallbackAction::Help => {
            show(bot, target, texts::help(), keyboards::back_to_menu()).await?;
        }

        CallbackAction::Rename => {
            let private = begin_rename(storage, user.id).await?;
            bot.send_message(private, texts::rename_prompt()).await?;
        }

        CallbackAction::MonkeyInfo(monkey_id) => {
            let (monkey, fights) = {
                let db = db.lock().await;
                let monkey = service::refresh_monkey_by_id(&db, monkey_id, now)?;
                let fights = db.count_fights(monkey.id)?;
                (monkey, fights)
            };
            let keyboard = if monkey.user_id == user.id {
                keyboards::back_to_menu()
            } else {
                keyboards::inline_actions(monkey.id)
            };
            show(bot, target, texts::public_card(&monkey, fights), keyboard).await?;
        }

        CallbackAction::ChallengeMenu => {
            duel::show_opponents(bot, target, user.id, db, settings).await?;
        }

        CallbackAction::PickOpponent(opponent) => {
            duel::pick_opponent(bot, target, user.id, opponent, db).await?;
        }

        CallbackAction::Bet { opponent, stake } => {
            duel::offer(bot, target, user.id, opponent, stake, db, book, settings).await?;
        }

        CallbackAction::CancelChallenge => {
            show(bot, target, "❌ Бой отменён".to_string(), keyboards::back_to_menu()).await?;
        }

        CallbackAction::Accept(id) => {
            duel::accept(bot, target, user.id, &id, db, book, settings).await?;
        }

        CallbackAction::Decline(id) => {
            duel::decline(bot, target, user.id, &id, book).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert!(matches!(Command::parse("/start", "macaco_bot"), Ok(Command::Start)));
        assert!(matches!(Command::parse("/my", "macaco_bot"), Ok(Command::My)));
        match Command::parse("/name Кинг Конг", "macaco_bot") {
            Ok(Command::Name(name)) => assert_eq!(name, "Кинг Конг"),
            _ => panic!("expected name command"),
        }
    }

    #[test]
    fn test_failure_text_hides_internal_errors() {
        let game: Box<dyn std::error::Error + Send + Sync> = Box::new(GameError::SelfChallenge);
        assert_eq!(failure_text(game.as_ref()), GameError::SelfChallenge.user_message());

        let internal: Box<dyn std::error::Error + Send + Sync> =
            Box::new(GameError::Database(rusqlite::Error::QueryReturnedNoRows));
        assert_eq!(failure_text(internal.as_ref()), texts::GENERIC_ERROR);

        let other: Box<dyn std::error::Error + Send + Sync> = "boom".into();
        assert_eq!(failure_text(other.as_ref()), texts::GENERIC_ERROR);
    }

    #[tokio::test]
    async fn test_rename_waits_in_private_chat_only() {
        let storage = InMemStorage::<State>::new();
        let group = ChatId(-100_500);

        let private = begin_rename(&storage, 42).await.unwrap();
        assert_eq!(private, ChatId(42));

        let in_private = MyDialogue::new(storage.clone(), private).get().await.unwrap();
        assert!(matches!(in_private, Some(State::WaitingForName)));
        let in_group = MyDialogue::new(storage.clone(), group).get().await.unwrap();
        assert!(in_group.is_none());
    }
}
