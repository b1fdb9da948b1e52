//! Conversation transcripts.
//!
//! Transcripts arrive as one string with speaker markers inline:
//! `agent: Hi, what can I get you? user: Two pad thai`. The text is cut
//! before every `agent:` and `user:` marker.

use serde::Serialize;

const AGENT: &str = "agent:";
const USER: &str = "user:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Agent,
    User,
    /// Text before the first marker
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptLine {
    pub speaker: Speaker,
    pub text: String,
}

/// Split a transcript into speaker lines. Blank segments are dropped.
pub fn parse_transcript(transcript: &str) -> Vec<TranscriptLine> {
    let mut cuts: Vec<usize> = transcript
        .match_indices(AGENT)
        .chain(transcript.match_indices(USER))
        .map(|(i, _)| i)
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut bounds = Vec::with_capacity(cuts.len() + 2);
    bounds.push(0);
    bounds.extend(cuts);
    bounds.push(transcript.len());
    bounds.dedup();

    bounds
        .windows(2)
        .map(|w| &transcript[w[0]..w[1]])
        .filter(|segment| !segment.trim().is_empty())
        .map(|segment| {
            let (speaker, text) = if let Some(rest) = segment.strip_prefix(AGENT) {
                (Speaker::Agent, rest)
            } else if let Some(rest) = segment.strip_prefix(USER) {
                (Speaker::User, rest)
            } else {
                (Speaker::Unknown, segment)
            };
            TranscriptLine {
                speaker,
                text: text.trim().to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line(speaker: Speaker, text: &str) -> TranscriptLine {
        TranscriptLine {
            speaker,
            text: text.into(),
        }
    }

    #[test]
    fn test_alternating_speakers() {
        let lines = parse_transcript("agent: Hi there! user: Two pad thai please agent: Sure.");
        assert_eq!(
            lines,
            vec![
                line(Speaker::Agent, "Hi there!"),
                line(Speaker::User, "Two pad thai please"),
                line(Speaker::Agent, "Sure."),
            ]
        );
    }

    #[test]
    fn test_leading_text_and_blanks() {
        let lines = parse_transcript("  call started\nagent: Hello\n   user:   ");
        assert_eq!(
            lines,
            vec![
                line(Speaker::Unknown, "call started"),
                line(Speaker::Agent, "Hello"),
                line(Speaker::User, ""),
            ]
        );
    }

    #[test]
    fn test_empty() {
        assert!(parse_transcript("").is_empty());
        assert!(parse_transcript("   ").is_empty());
    }
}
