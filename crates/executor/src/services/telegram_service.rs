//! Chat front end: turns inbound messages into orchestrator calls and
//! renders signals, confirmation keyboards, and trade results.

use std::env;
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, Me};
use teloxide::utils::command::BotCommands;
use tracing::{error, info};

use common::models::{OrderKind, TradeResult, TradeSignal};
use common::token;
use signals::risk::{format_risk_reward, risk_reward};

use crate::services::orchestrator::{ConfirmOutcome, Orchestrator, SignalOutcome};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "load a shared signal token.")]
    Start(String),
    #[command(description = "show the futures wallet balance.")]
    Balance,
    #[command(description = "show this help.")]
    Help,
}

/// Chats the bot will act for. Empty list means everyone.
#[derive(Clone, Default)]
pub struct ChatAllowList(Arc<Vec<i64>>);

impl ChatAllowList {
    pub fn new(chats: Vec<i64>) -> Self {
        Self(Arc::new(chats))
    }

    fn permits(&self, chat: ChatId) -> bool {
        self.0.is_empty() || self.0.contains(&chat.0)
    }
}

pub struct TelegramService {
    bot: Bot,
    orchestrator: Arc<Orchestrator>,
    allow_list: ChatAllowList,
}

impl TelegramService {
    /// Missing bot credentials are a startup failure, so this panics like
    /// the rest of the critical config path.
    pub fn new(orchestrator: Arc<Orchestrator>, allow_list: ChatAllowList) -> Self {
        let bot_token = env::var("TELEGRAM_BOT_TOKEN").expect("TELEGRAM_BOT_TOKEN not set in .env");
        Self {
            bot: Bot::new(bot_token),
            orchestrator,
            allow_list,
        }
    }

    pub async fn run(self) {
        info!("Starting Telegram Signal Service");

        let handler = dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(handle_command),
            )
            .branch(Update::filter_message().endpoint(handle_message))
            .branch(Update::filter_callback_query().endpoint(handle_callback));

        Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![self.orchestrator, self.allow_list])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

/// Pending-map key: the sender when known, the chat otherwise.
fn requester_id(msg: &Message) -> i64 {
    msg.from
        .as_ref()
        .map(|user| user.id.0 as i64)
        .unwrap_or(msg.chat.id.0)
}

fn confirm_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Limit", "exec:limit"),
        InlineKeyboardButton::callback("⚡ Market", "exec:market"),
        InlineKeyboardButton::callback("❌ Cancel", "cancel"),
    ]])
}

fn crossed_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("⚡ Market instead", "exec:market"),
        InlineKeyboardButton::callback("❌ Cancel", "cancel"),
    ]])
}

fn render_signal(signal: &TradeSignal) -> String {
    let mut text = format!(
        "📡 {} {}\nEntry: {}\nStop: {}\nTargets: {}\nR/R: {}",
        signal.symbol,
        signal.side,
        signal.entry_price,
        signal.stop_loss,
        signal
            .take_profits
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        format_risk_reward(risk_reward(signal)),
    );
    if let Some(lev) = signal.leverage {
        text.push_str(&format!("\nLeverage: {lev}x"));
    }
    text.push_str("\n\nExecute?");
    text
}

fn render_result(result: &TradeResult) -> String {
    if result.success {
        format!("✅ {} {}: {}", result.signal.symbol, result.signal.side, result.message)
    } else {
        format!("🚫 {} not executed: {}", result.signal.symbol, result.message)
    }
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    orchestrator: Arc<Orchestrator>,
    allow_list: ChatAllowList,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if !allow_list.permits(msg.chat.id) {
        return Ok(());
    }

    match orchestrator.on_message(requester_id(&msg), text).await {
        SignalOutcome::Pending(signal) => {
            bot.send_message(msg.chat.id, render_signal(&signal))
                .reply_markup(confirm_keyboard())
                .await?;
        }
        SignalOutcome::AutoExecuted(result) => {
            bot.send_message(msg.chat.id, render_result(&result)).await?;
        }
        // Chatter. Stay silent.
        SignalOutcome::Ignored => {}
    }
    Ok(())
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    me: Me,
    cmd: Command,
    orchestrator: Arc<Orchestrator>,
    allow_list: ChatAllowList,
) -> ResponseResult<()> {
    if !allow_list.permits(msg.chat.id) {
        return Ok(());
    }

    match cmd {
        Command::Start(payload) if !payload.trim().is_empty() => {
            match token::decode(&payload) {
                Ok(signal) => {
                    orchestrator.hold(requester_id(&msg), signal.clone()).await;
                    bot.send_message(msg.chat.id, render_signal(&signal))
                        .reply_markup(confirm_keyboard())
                        .await?;
                }
                Err(e) => {
                    bot.send_message(msg.chat.id, format!("Could not read signal link: {e}"))
                        .await?;
                }
            }
        }
        Command::Start(_) => {
            bot.send_message(
                msg.chat.id,
                format!(
                    "Paste a trade signal and {} will prepare the order.\n\n{}",
                    me.username(),
                    Command::descriptions()
                ),
            )
            .await?;
        }
        Command::Balance => match orchestrator.balance().await {
            Ok(payload) => {
                bot.send_message(msg.chat.id, format!("💰 {payload}")).await?;
            }
            Err(e) => {
                bot.send_message(msg.chat.id, format!("Balance unavailable: {e}"))
                    .await?;
            }
        },
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
    }
    Ok(())
}

async fn handle_callback(
    bot: Bot,
    query: CallbackQuery,
    orchestrator: Arc<Orchestrator>,
    allow_list: ChatAllowList,
) -> ResponseResult<()> {
    // Answer first so the button stops spinning.
    bot.answer_callback_query(&query.id).await?;

    let Some(message) = query.regular_message() else {
        return Ok(());
    };
    let chat_id = message.chat.id;
    if !allow_list.permits(chat_id) {
        return Ok(());
    }

    let requester = query.from.id.0 as i64;
    match query.data.as_deref() {
        Some("exec:limit") => {
            report_confirmation(&bot, chat_id, orchestrator.confirm(requester, OrderKind::Limit).await)
                .await?
        }
        Some("exec:market") => {
            report_confirmation(&bot, chat_id, orchestrator.confirm(requester, OrderKind::Market).await)
                .await?
        }
        Some("cancel") => {
            let had_pending = orchestrator.cancel(requester).await;
            let text = if had_pending { "Signal cancelled." } else { "Nothing pending." };
            bot.send_message(chat_id, text).await?;
        }
        other => {
            error!("unknown callback payload: {other:?}");
        }
    }
    Ok(())
}

async fn report_confirmation(
    bot: &Bot,
    chat_id: ChatId,
    outcome: ConfirmOutcome,
) -> ResponseResult<()> {
    match outcome {
        ConfirmOutcome::NoPending => {
            bot.send_message(chat_id, "Nothing pending. Send a signal first.")
                .await?;
        }
        ConfirmOutcome::PriceCrossed { signal, current } => {
            bot.send_message(
                chat_id,
                format!(
                    "⚠️ {} already trades at {current}, past your entry {}.\nA limit order would fill immediately. Execute at market instead?",
                    signal.symbol, signal.entry_price
                ),
            )
            .reply_markup(crossed_keyboard())
            .await?;
        }
        ConfirmOutcome::Done(result) => {
            bot.send_message(chat_id, render_result(&result)).await?;
        }
    }
    Ok(())
}
