//! Dice, coin, rock/paper/scissors and the magic 8-ball.
//!
//! All randomness comes from the `rng` argument so the handlers can be
//! replayed with a seeded generator.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::args::{self, DiceSpec, RpsChoice};
use crate::errors::CommandError;

pub const EIGHT_BALL_RESPONSES: [&str; 20] = [
    "It is certain.",
    "It is decidedly so.",
    "Without a doubt.",
    "Yes - definitely.",
    "You may rely on it.",
    "As I see it, yes.",
    "Most likely.",
    "Outlook good.",
    "Yes.",
    "Signs point to yes.",
    "Reply hazy, try again.",
    "Ask again later.",
    "Better not tell you now.",
    "Cannot predict now.",
    "Concentrate and ask again.",
    "Don't count on it.",
    "My reply is no.",
    "My sources say no.",
    "Outlook not so good.",
    "Very doubtful.",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceRoll {
    pub values: Vec<u32>,
    pub total: u64,
}

pub fn roll_dice<R: Rng + ?Sized>(spec: DiceSpec, rng: &mut R) -> DiceRoll {
    let values: Vec<u32> = (0..spec.count)
        .map(|_| rng.gen_range(1..=spec.sides))
        .collect();
    let total = values.iter().map(|v| u64::from(*v)).sum();
    DiceRoll { values, total }
}

/// `/roll NdS`
pub fn roll<R: Rng + ?Sized>(args: &[String], rng: &mut R) -> Result<String, CommandError> {
    let spec = args::parse_dice(args)?;
    let roll = roll_dice(spec, rng);
    let values: Vec<String> = roll.values.iter().map(u32::to_string).collect();
    Ok(format!(
        "You rolled: {}. Total: {}",
        values.join(", "),
        roll.total
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinSide {
    Heads,
    Tails,
}

/// `/flip`
pub fn flip<R: Rng + ?Sized>(rng: &mut R) -> String {
    let side = if rng.gen_bool(0.5) {
        CoinSide::Heads
    } else {
        CoinSide::Tails
    };
    format!("It's {:?}!", side)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

impl RpsChoice {
    fn beats(self, other: RpsChoice) -> bool {
        matches!(
            (self, other),
            (RpsChoice::Rock, RpsChoice::Scissors)
                | (RpsChoice::Scissors, RpsChoice::Paper)
                | (RpsChoice::Paper, RpsChoice::Rock)
        )
    }
}

/// Outcome from the user's point of view
pub fn resolve(user: RpsChoice, bot: RpsChoice) -> Outcome {
    if user == bot {
        Outcome::Tie
    } else if user.beats(bot) {
        Outcome::Win
    } else {
        Outcome::Loss
    }
}

/// `/rps <choice>`
pub fn rps<R: Rng + ?Sized>(args: &[String], rng: &mut R) -> Result<String, CommandError> {
    let user = args::parse_rps(args)?;
    let bot = *RpsChoice::ALL
        .choose(rng)
        .unwrap_or(&RpsChoice::Rock);

    Ok(match resolve(user, bot) {
        Outcome::Tie => "It's a tie!".to_string(),
        Outcome::Win => format!("You win! I chose {}.", bot.as_str()),
        Outcome::Loss => format!("You lose! I chose {}.", bot.as_str()),
    })
}

/// `/8ball <question>`. The question is never read, only required.
pub fn eight_ball<R: Rng + ?Sized>(
    args: &[String],
    rng: &mut R,
) -> Result<&'static str, CommandError> {
    if args.is_empty() {
        return Err(CommandError::validation("Please ask a question."));
    }
    let index = rng.gen_range(0..EIGHT_BALL_RESPONSES.len());
    Ok(EIGHT_BALL_RESPONSES[index])
}
