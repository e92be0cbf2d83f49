//! Turns the raw tokens after a command into typed arguments.
//!
//! Every parser either returns the typed value or a
//! [`CommandError::Validation`] carrying the text the user should see.
//! Nothing here touches the network or a random source.

use crate::errors::CommandError;

pub const DICE_USAGE: &str = "Please provide dice in NdS format (e.g., /roll 2d6).";
pub const RPS_USAGE: &str = "Please choose rock, paper, or scissors.";
pub const POLL_USAGE: &str = r#"Usage: /poll "Question" "Option 1" "Option 2" ..."#;

/// Upper bound on dice per roll; the reply has to fit in one chat message
pub const MAX_DICE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceSpec {
    pub count: u32,
    pub sides: u32,
}

/// Parse `NdS`, both numbers at least 1.
pub fn parse_dice(args: &[String]) -> Result<DiceSpec, CommandError> {
    let token = args
        .first()
        .ok_or_else(|| CommandError::validation(DICE_USAGE))?;

    let (count, sides) = token
        .split_once('d')
        .ok_or_else(|| CommandError::validation(DICE_USAGE))?;

    let count = parse_positive(count).ok_or_else(|| CommandError::validation(DICE_USAGE))?;
    let sides = parse_positive(sides).ok_or_else(|| CommandError::validation(DICE_USAGE))?;

    if count > MAX_DICE {
        return Err(CommandError::validation(format!(
            "Please roll at most {} dice at a time.",
            MAX_DICE
        )));
    }

    Ok(DiceSpec { count, sides })
}

/// Digits only: no sign, no whitespace, no empty string
fn parse_positive(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u32>().ok().filter(|n| *n >= 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpsChoice {
    Rock,
    Paper,
    Scissors,
}

impl RpsChoice {
    pub const ALL: [RpsChoice; 3] = [RpsChoice::Rock, RpsChoice::Paper, RpsChoice::Scissors];

    pub fn as_str(self) -> &'static str {
        match self {
            RpsChoice::Rock => "rock",
            RpsChoice::Paper => "paper",
            RpsChoice::Scissors => "scissors",
        }
    }
}

pub fn parse_rps(args: &[String]) -> Result<RpsChoice, CommandError> {
    let token = args
        .first()
        .ok_or_else(|| CommandError::validation(RPS_USAGE))?
        .to_lowercase();

    RpsChoice::ALL
        .into_iter()
        .find(|choice| choice.as_str() == token)
        .ok_or_else(|| CommandError::validation(RPS_USAGE))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSpec {
    pub question: String,
    pub options: Vec<String>,
}

/// Parse `"Question" "Option 1" "Option 2" ...`.
///
/// Tokens are rejoined with single spaces and split on `"`; every
/// non-empty trimmed piece is a field. Unbalanced quotes are accepted and
/// the trailing fragment simply becomes another field.
pub fn parse_poll(args: &[String]) -> Result<PollSpec, CommandError> {
    if args.len() < 3 {
        return Err(CommandError::validation(POLL_USAGE));
    }

    let joined = args.join(" ");
    let mut fields: Vec<String> = joined
        .split('"')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect();

    if fields.len() < 3 {
        return Err(CommandError::validation(POLL_USAGE));
    }

    let question = fields.remove(0);
    Ok(PollSpec {
        question,
        options: fields,
    })
}

/// All tokens joined with spaces, or `usage` if there are none.
pub fn require_text(args: &[String], usage: &str) -> Result<String, CommandError> {
    if args.is_empty() {
        return Err(CommandError::validation(usage));
    }
    Ok(args.join(" "))
}

/// The first token, or `usage` if there is none.
pub fn require_first<'a>(args: &'a [String], usage: &str) -> Result<&'a str, CommandError> {
    args.first()
        .map(String::as_str)
        .ok_or_else(|| CommandError::validation(usage))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_parse_dice_valid() {
        assert_eq!(
            parse_dice(&tokens("2d6")).unwrap(),
            DiceSpec { count: 2, sides: 6 }
        );
        assert_eq!(
            parse_dice(&tokens("1d1")).unwrap(),
            DiceSpec { count: 1, sides: 1 }
        );
        assert_eq!(
            parse_dice(&tokens("3d20 extra")).unwrap(),
            DiceSpec {
                count: 3,
                sides: 20
            }
        );
    }

    #[test]
    fn test_parse_dice_rejects_bad_shapes() {
        for bad in ["d6", "2x6", "-1d6", "2d", "0d6", "2d0", "2d6d6", "+2d6", "2 d6", "ad6"] {
            let err = parse_dice(&tokens(bad)).unwrap_err();
            assert_eq!(err.reply_text(), DICE_USAGE, "input {:?}", bad);
        }
        assert_eq!(parse_dice(&[]).unwrap_err().reply_text(), DICE_USAGE);
    }

    #[test]
    fn test_parse_dice_rejects_too_many_dice() {
        let err = parse_dice(&tokens("101d6")).unwrap_err();
        assert!(matches!(err, CommandError::Validation(_)));
        assert!(parse_dice(&tokens("100d6")).is_ok());
    }

    #[test]
    fn test_parse_rps_is_case_insensitive() {
        assert_eq!(parse_rps(&tokens("Rock")).unwrap(), RpsChoice::Rock);
        assert_eq!(parse_rps(&tokens("PAPER")).unwrap(), RpsChoice::Paper);
        assert_eq!(parse_rps(&tokens("scissors")).unwrap(), RpsChoice::Scissors);
    }

    #[test]
    fn test_parse_rps_rejects_other_words() {
        assert_eq!(parse_rps(&tokens("lizard")).unwrap_err().reply_text(), RPS_USAGE);
        assert_eq!(parse_rps(&[]).unwrap_err().reply_text(), RPS_USAGE);
    }

    #[test]
    fn test_parse_poll_quoted_fields() {
        let poll = parse_poll(&tokens(r#""Question?" "A" "B""#)).unwrap();
        assert_eq!(poll.question, "Question?");
        assert_eq!(poll.options, vec!["A", "B"]);
    }

    #[test]
    fn test_parse_poll_multi_word_fields() {
        let poll = parse_poll(&tokens(r#""Where should we eat?" "Pizza place" "Sushi bar" "Home""#))
            .unwrap();
        assert_eq!(poll.question, "Where should we eat?");
        assert_eq!(poll.options, vec!["Pizza place", "Sushi bar", "Home"]);
    }

    #[test]
    fn test_parse_poll_needs_three_fields() {
        let err = parse_poll(&tokens(r#""What do you think about" "this?""#)).unwrap_err();
        assert_eq!(err.reply_text(), POLL_USAGE);

        let err = parse_poll(&tokens(r#""Q" "A""#)).unwrap_err();
        assert_eq!(err.reply_text(), POLL_USAGE);
    }

    #[test]
    fn test_parse_poll_accepts_unbalanced_quotes() {
        let poll = parse_poll(&tokens(r#""Q" "A" "B"#)).unwrap();
        assert_eq!(poll.options, vec!["A", "B"]);
    }

    #[test]
    fn test_require_text_joins_tokens() {
        assert_eq!(
            require_text(&tokens("New York"), "Please provide a city name.").unwrap(),
            "New York"
        );
        assert_eq!(
            require_text(&[], "Please provide a city name.")
                .unwrap_err()
                .reply_text(),
            "Please provide a city name."
        );
    }

    #[test]
    fn test_require_first() {
        assert_eq!(require_first(&tokens("bitcoin usd"), "x").unwrap(), "bitcoin");
        assert!(require_first(&[], "x").is_err());
    }
}
