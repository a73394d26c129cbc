use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::TranscriptsError;

static HANDLE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i:youtube\.com)/@([\w.-]+)").unwrap());
static CHANNEL_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i:youtube\.com)/channel/(UC[\w-]+)").unwrap());
static CUSTOM_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i:youtube\.com)/c/([\w-]+)").unwrap());
static USER_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i:youtube\.com)/user/([\w-]+)").unwrap());
static HANDLE_SHORTHAND: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^@([\w.-]+)$").unwrap());

/// A YouTube channel, in whichever form the user referred to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelId {
    /// `youtube.com/@handle` or `@handle`
    Handle(String),
    /// `youtube.com/channel/UC...`
    Id(String),
    /// `youtube.com/c/name`
    Custom(String),
    /// `youtube.com/user/name`
    User(String),
}

impl ChannelId {
    /// Parse a channel URL or `@handle` shorthand
    pub fn parse(input: &str) -> Result<Self, TranscriptsError> {
        let trimmed = input.trim();
        let decoded = urlencoding::decode(trimmed)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| trimmed.to_string());

        let capture = |re: &Regex| {
            re.captures(&decoded)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        };

        if let Some(handle) = capture(&HANDLE_URL) {
            return Ok(Self::Handle(handle));
        }
        if let Some(id) = capture(&CHANNEL_URL) {
            return Ok(Self::Id(id));
        }
        if let Some(name) = capture(&CUSTOM_URL) {
            return Ok(Self::Custom(name));
        }
        if let Some(name) = capture(&USER_URL) {
            return Ok(Self::User(name));
        }
        if let Some(handle) = capture(&HANDLE_SHORTHAND) {
            return Ok(Self::Handle(handle));
        }

        Err(TranscriptsError::InvalidChannel(trimmed.to_string()))
    }

    /// The bare name or id, without any prefix
    pub fn name(&self) -> &str {
        match self {
            Self::Handle(name) | Self::Id(name) | Self::Custom(name) | Self::User(name) => name,
        }
    }

    /// Canonical URL of the channel's videos tab
    pub fn videos_url(&self) -> String {
        let name = urlencoding::encode(self.name());
        match self {
            Self::Handle(_) => format!("https://www.youtube.com/@{}/videos", name),
            Self::Id(_) => format!("https://www.youtube.com/channel/{}/videos", name),
            Self::Custom(_) => format!("https://www.youtube.com/c/{}/videos", name),
            Self::User(_) => format!("https://www.youtube.com/user/{}/videos", name),
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handle(name) => write!(f, "@{}", name),
            Self::Id(id) => write!(f, "{}", id),
            Self::Custom(name) => write!(f, "c/{}", name),
            Self::User(name) => write!(f, "user/{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_shapes() {
        assert_eq!(
            ChannelId::parse("https://www.youtube.com/@mkbhd").unwrap(),
            ChannelId::Handle("mkbhd".into())
        );
        assert_eq!(
            ChannelId::parse("https://youtube.com/channel/UCBcRF18a7Qf58cCRy5xuWwQ/videos")
                .unwrap(),
            ChannelId::Id("UCBcRF18a7Qf58cCRy5xuWwQ".into())
        );
        assert_eq!(
            ChannelId::parse("https://www.youtube.com/c/LinusTechTips").unwrap(),
            ChannelId::Custom("LinusTechTips".into())
        );
        assert_eq!(
            ChannelId::parse("http://m.youtube.com/user/marquesbrownlee?feature=x").unwrap(),
            ChannelId::User("marquesbrownlee".into())
        );
    }

    #[test]
    fn test_parse_shorthand_and_whitespace() {
        assert_eq!(
            ChannelId::parse("  @TED-Ed \n").unwrap(),
            ChannelId::Handle("TED-Ed".into())
        );
        assert_eq!(
            ChannelId::parse("@oxford.sparks").unwrap(),
            ChannelId::Handle("oxford.sparks".into())
        );
    }

    #[test]
    fn test_parse_percent_encoded_handle() {
        let parsed = ChannelId::parse("https://www.youtube.com/@%E3%81%82%E3%81%84").unwrap();
        assert_eq!(parsed, ChannelId::Handle("あい".into()));
        assert_eq!(
            parsed.videos_url(),
            "https://www.youtube.com/@%E3%81%82%E3%81%84/videos"
        );
    }

    #[test]
    fn test_parse_rejects_unknown_shapes() {
        for input in [
            "",
            "@",
            "mkbhd",
            "https://vimeo.com/@someone",
            "https://www.youtube.com/watch?v=abc",
            "@bad handle",
        ] {
            let err = ChannelId::parse(input).unwrap_err();
            assert!(matches!(err, TranscriptsError::InvalidChannel(_)), "{input}");
        }
    }

    #[test]
    fn test_videos_url() {
        assert_eq!(
            ChannelId::Id("UCabc".into()).videos_url(),
            "https://www.youtube.com/channel/UCabc/videos"
        );
        assert_eq!(
            ChannelId::User("someone".into()).videos_url(),
            "https://www.youtube.com/user/someone/videos"
        );
        assert_eq!(ChannelId::Handle("x".into()).to_string(), "@x");
    }
}
