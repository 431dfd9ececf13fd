use async_trait::async_trait;
use rand::seq::SliceRandom;

use crate::{
    ports::ChatTurn,
    router::{CommandContext, CommandHandler},
    Result,
};

const EIGHT_BALL_RESPONSES: [&str; 20] = [
    "🟢 It is certain.",
    "🟢 It is decidedly so.",
    "🟢 Without a doubt.",
    "🟢 Yes definitely.",
    "🟢 You may rely on it.",
    "🟢 As I see it, yes.",
    "🟢 Most likely.",
    "🟢 Outlook good.",
    "🟢 Yes.",
    "🟢 Signs point to yes.",
    "🟡 Reply hazy, try again.",
    "🟡 Ask again later.",
    "🟡 Better not tell you now.",
    "🟡 Cannot predict now.",
    "🟡 Concentrate and ask again.",
    "🔴 Don't count on it.",
    "🔴 My reply is no.",
    "🔴 My sources say no.",
    "🔴 Outlook not so good.",
    "🔴 Very doubtful.",
];

const WELCOME_PROMPT: &str = "You are a Twitch bot. You provide a unique welcome reply to each user and thank them for joining my Twitch stream.";
const INSULT_PROMPT: &str =
    "You are a bully, a comedian, a very funny person, a brilliant jokester.";

pub struct EightBall;

#[async_trait]
impl CommandHandler for EightBall {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        if ctx.args().is_empty() {
            return ctx
                .reply("ummm... you need to ask me a question before I can answer.")
                .await;
        }

        let answer = {
            let mut rng = rand::thread_rng();
            EIGHT_BALL_RESPONSES
                .choose(&mut rng)
                .copied()
                .unwrap_or(EIGHT_BALL_RESPONSES[10])
        };
        ctx.reply(&format!("🎱 says.... {answer}")).await
    }
}

/// Greeting words land here with the whole line as arguments.
pub struct Hello;

#[async_trait]
impl CommandHandler for Hello {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let turns = vec![
            ChatTurn::system(WELCOME_PROMPT),
            ChatTurn::user(ctx.args().to_string()),
        ];
        complete_and_reply(ctx, &turns).await
    }
}

/// `@bot <text>`: free-form LLM reply.
pub struct Ai;

#[async_trait]
impl CommandHandler for Ai {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        if ctx.services.completion.is_none() {
            return ctx.reply(&super::no_llm_reply(ctx)).await;
        }
        if ctx.args().is_empty() {
            return ctx.reply("Yes?.").await;
        }

        let nick = &ctx.config.twitch_nick;
        let turns = vec![
            ChatTurn::system(
                "You are a Twitch bot in an 18+ channel. Trolling, banter and strong language are allowed.",
            ),
            ChatTurn::assistant(
                "lmao look at this noob! Absolutely #wrecked! Hold this L broski! hahaha",
            ),
            ChatTurn::user(format!(
                "lmao! @{nick} that was funny! Love the troll man! Let's keep talking trash!"
            )),
            ChatTurn::assistant("okay! lfg!!! KEKW"),
            ChatTurn::user(ctx.args().to_string()),
        ];
        complete_and_reply(ctx, &turns).await
    }
}

pub struct InsultMe;

#[async_trait]
impl CommandHandler for InsultMe {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let turns = vec![
            ChatTurn::system(INSULT_PROMPT),
            ChatTurn::assistant("Shall we play a game of who has the best insult?"),
            ChatTurn::user("Yes! You go first!"),
        ];
        complete_and_reply(ctx, &turns).await
    }
}

async fn complete_and_reply(ctx: &CommandContext<'_>, turns: &[ChatTurn]) -> Result<()> {
    let Some(llm) = ctx.services.completion.clone() else {
        return ctx.reply(&super::no_llm_reply(ctx)).await;
    };

    match llm.complete(turns).await {
        Ok(text) if !text.trim().is_empty() => ctx.reply(&text).await,
        Ok(_) => ctx.reply("I've got nothing. Ask me again?").await,
        Err(e) => {
            tracing::warn!("completion failed: {e}");
            ctx.reply("Sorry, my brain is offline right now. Try again in a bit.")
                .await
        }
    }
}

pub struct Lurk;

#[async_trait]
impl CommandHandler for Lurk {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        let text = format!(
            "{} rodger that! Thank you for supporting! ❤️",
            ctx.message.author.mention()
        );
        ctx.send(&text).await
    }
}

/// Alert hashtag: nag the streamer and tell the viewer how to redeem.
pub struct Alert;

#[async_trait]
impl CommandHandler for Alert {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        ctx.send("🐶 🐺 GIVE THE GOOD BOY A GOD DAMN TREAT! 🐶 🐺")
            .await?;
        let reward = ctx.config.alert_hashtag.trim_start_matches('#');
        let text = format!(
            "To give Gus a treat, please use the following command: {} {reward}",
            super::prefixed(ctx, "redeem")
        );
        ctx.reply(&text).await
    }
}

pub struct GusCam;

#[async_trait]
impl CommandHandler for GusCam {
    async fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        ctx.send("🐶 🐺 GIVE THE PEOPLE WHAT THEY WANT! GUUUUUUS CAAAAAAAAM!!!!!!!! 🐶 🐺")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        commands::test_support::Harness,
        ports::Role,
        router::Services,
        testing::{CannedCompletion, Sent},
    };

    fn with_llm(llm: std::sync::Arc<CannedCompletion>) -> Services {
        Services {
            completion: Some(llm),
            ..Services::default()
        }
    }

    #[tokio::test]
    async fn eight_ball_needs_a_question() {
        let mut h = Harness::new("tcb-cmd-8ball", Services::default());
        h.say("viewer", "!8ball").await;
        h.say("viewer", "!8ball will I win?").await;

        let texts = h.texts();
        assert_eq!(
            texts[0],
            "ummm... you need to ask me a question before I can answer."
        );
        let answer = texts[1].strip_prefix("🎱 says.... ").unwrap();
        assert!(EIGHT_BALL_RESPONSES.contains(&answer));
    }

    #[tokio::test]
    async fn greeting_without_llm_apologizes() {
        let mut h = Harness::new("tcb-cmd-hello-nollm", Services::default());
        h.say("viewer", "Hello there").await;
        assert_eq!(
            h.texts(),
            vec!["Sorry, @streamer does not have GPT implemented."]
        );
    }

    #[tokio::test]
    async fn greeting_sends_the_line_to_the_llm() {
        let llm = CannedCompletion::ok("Welcome in!");
        let mut h = Harness::new("tcb-cmd-hello", with_llm(llm.clone()));
        h.say("viewer", "HI everyone").await;

        let prompts = llm.prompts.lock().unwrap().clone();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0][0].role, Role::System);
        assert_eq!(prompts[0][1].content, "HI everyone");
        assert_eq!(
            h.chat.sent.lock().unwrap().clone(),
            vec![Sent::Reply {
                to: "viewer".to_string(),
                text: "Welcome in!".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn mention_with_no_text_gets_a_prompt_back() {
        let llm = CannedCompletion::ok("unused");
        let mut h = Harness::new("tcb-cmd-ai-empty", with_llm(llm.clone()));
        h.say("viewer", "@gusbot").await;
        assert_eq!(h.texts(), vec!["Yes?."]);
        assert!(llm.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn long_ai_answers_are_chunked() {
        let long = vec!["blah"; 200].join(" ");
        let llm = CannedCompletion::ok(&long);
        let mut h = Harness::new("tcb-cmd-ai-long", with_llm(llm));
        h.say("viewer", "@GusBot tell me a story").await;

        let texts = h.texts();
        assert_eq!(texts.len(), 3);
        assert!(texts[0].starts_with("(1/3) blah"));
        assert!(texts[2].starts_with("(3/3) blah"));
    }

    #[tokio::test]
    async fn llm_failure_is_reported_in_chat() {
        let mut h = Harness::new("tcb-cmd-insult-fail", with_llm(CannedCompletion::failing()));
        h.say("viewer", "!insultme").await;
        assert_eq!(
            h.texts(),
            vec!["Sorry, my brain is offline right now. Try again in a bit."]
        );
    }

    #[tokio::test]
    async fn hashtag_triggers_alert_pair() {
        let mut h = Harness::new("tcb-cmd-alert", Services::default());
        h.say("viewer", "#treatsforgus he was good").await;

        let sent = h.chat.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert!(matches!(sent[0], Sent::Send { .. }));
        assert_eq!(
            sent[1],
            Sent::Reply {
                to: "viewer".to_string(),
                text: "To give Gus a treat, please use the following command: !redeem treatsforgus"
                    .to_string()
            }
        );
    }

    #[tokio::test]
    async fn lurk_mentions_the_author() {
        let mut h = Harness::new("tcb-cmd-lurk", Services::default());
        h.say("Viewer", "!lurk").await;
        assert_eq!(
            h.texts(),
            vec!["@Viewer rodger that! Thank you for supporting! ❤️"]
        );
    }
}
