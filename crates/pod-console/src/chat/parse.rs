//! Pure pieces of the chat protocol: read-buffer line framing, chat-line
//! parsing, and the per-user display color.

/// Splits a raw byte stream into complete lines. Partial trailing data
/// is retained across reads — never dropped, never double-processed.
#[derive(Debug, Default)]
pub struct LineAssembler {
    pending: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read's worth of bytes; returns the complete lines it
    /// unlocked, stripped of the line terminator.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut raw: Vec<u8> = self.pending.drain(..=pos).collect();
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
            lines.push(String::from_utf8_lossy(&raw).into_owned());
        }
        lines
    }
}

/// Liveness probe from the server; must be answered immediately or the
/// server force-disconnects.
pub fn is_liveness_probe(line: &str) -> bool {
    line.starts_with("PING")
}

pub const LIVENESS_REPLY: &str = "PONG";

/// Parse a raw protocol line as a chat message:
/// `:sender!user@host PRIVMSG #channel :text`. Returns author and text,
/// or None for the protocol's many other line kinds.
pub fn parse_chat_line(line: &str) -> Option<(String, String)> {
    let (prefix, rest) = line.split_once("PRIVMSG")?;
    let text = rest.split_once(':')?.1.trim();
    let sender = prefix.trim().strip_prefix(':')?;
    let bang = sender.find('!')?;
    if let Some(at) = sender.find('@') {
        if at < bang {
            return None;
        }
    }
    let author = &sender[..bang];
    if author.is_empty() {
        return None;
    }
    Some((author.to_string(), text.to_string()))
}

/// Bright tones only; dark ones vanish on the black background.
pub const USER_PALETTE: [[u8; 3]; 8] = [
    [255, 80, 80],
    [50, 255, 50],
    [80, 160, 255],
    [255, 255, 80],
    [255, 100, 255],
    [0, 255, 255],
    [255, 160, 50],
    [200, 200, 200],
];

/// Stable per-user color. The server sends no color data, so hash the
/// name into the palette — a given user keeps one color all session.
pub fn user_color(username: &str) -> [u8; 3] {
    let hash = username
        .chars()
        .fold(0u32, |acc, c| acc.wrapping_add(c as u32));
    USER_PALETTE[(hash % USER_PALETTE.len() as u32) as usize]
}

/// Channel names are case-insensitive on the wire; joins use lowercase.
pub fn normalize_channel(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembler_reassembles_split_line() {
        let mut asm = LineAssembler::new();
        assert!(asm.push(b":nick!u@h PRIVMSG #chan :hel").is_empty());
        let lines = asm.push(b"lo world\r\nPING :tmi\r\n");
        assert_eq!(
            lines,
            vec![
                ":nick!u@h PRIVMSG #chan :hello world".to_string(),
                "PING :tmi".to_string(),
            ]
        );
        assert!(asm.push(b"").is_empty());
    }

    #[test]
    fn test_assembler_handles_many_lines_in_one_read() {
        let mut asm = LineAssembler::new();
        let lines = asm.push(b"one\ntwo\nthree\npartial");
        assert_eq!(lines, vec!["one", "two", "three"]);
        assert_eq!(asm.push(b"\n"), vec!["partial"]);
    }

    #[test]
    fn test_parse_chat_message() {
        let line = ":waffle!waffle@waffle.tmi.twitch.tv PRIVMSG #somechannel :good stream";
        let (author, text) = parse_chat_line(line).unwrap();
        assert_eq!(author, "waffle");
        assert_eq!(text, "good stream");
    }

    #[test]
    fn test_parse_keeps_colons_inside_text() {
        let line = ":a!a@a PRIVMSG #c :note: this has :colons:";
        let (_, text) = parse_chat_line(line).unwrap();
        assert_eq!(text, "note: this has :colons:");
    }

    #[test]
    fn test_parse_rejects_other_line_kinds() {
        assert!(parse_chat_line(":tmi.twitch.tv 001 justinfan12345 :Welcome, GLHF!").is_none());
        assert!(parse_chat_line(":nick!u@h JOIN #chan").is_none());
        // '@' before '!' is not a valid sender token
        assert!(parse_chat_line(":a@b!c PRIVMSG #chan :hi").is_none());
        assert!(parse_chat_line("").is_none());
    }

    #[test]
    fn test_liveness_probe() {
        assert!(is_liveness_probe("PING :tmi.twitch.tv"));
        assert!(!is_liveness_probe(":a!a@a PRIVMSG #c :PING"));
    }

    #[test]
    fn test_user_color_stable_and_indexed() {
        // 'a'+'b'+'c' = 294, 294 % 8 = 6
        assert_eq!(user_color("abc"), USER_PALETTE[6]);
        assert_eq!(user_color("abc"), user_color("abc"));
    }

    #[test]
    fn test_normalize_channel() {
        assert_eq!(normalize_channel("  WaffleChan "), "wafflechan");
    }
}
